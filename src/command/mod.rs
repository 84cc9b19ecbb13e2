//! AT Commands for the SIMCom SIM7020 NB-IoT module family\
//! Following the SIM7020 Series AT Command Manual V1.05
//!
//! Commands are serialized through `atat`. The response matcher of
//! [`GsmClient`](crate::client::GsmClient) finds the information line of a
//! reply among unsolicited notifications, and the line is then decoded into
//! the command's `AtatResp` type with `serde_at`.

pub mod coap;
pub mod control;
pub mod device_lock;
pub mod ip_transport_layer;
pub mod network_service;
pub mod psn;

use atat::atat_derive::{AtatCmd, AtatResp};

#[derive(Clone, AtatResp)]
pub struct NoResponse;

#[derive(Clone, AtatCmd)]
#[at_cmd("", NoResponse, timeout_ms = 1000)]
pub struct AT;
