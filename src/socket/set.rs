use super::{Socket, SocketHandle, SocketKind, MUX_COUNT};
use crate::error::Error;

/// Identifies the [`Connection`](super::Connection) that registered a slot.
///
/// A connection only touches a slot carrying its own token, so an object whose
/// slot was taken over by a newer connection cannot read or close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OwnerToken(u32);

impl OwnerToken {
    pub(crate) const fn first() -> Self {
        OwnerToken(1)
    }
}

/// The connection registry: a fixed table from mux id to at most one socket.
#[derive(Debug)]
pub struct Set {
    sockets: [Option<Socket>; MUX_COUNT],
    next_owner: u32,
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl Set {
    pub fn new() -> Set {
        Set {
            sockets: core::array::from_fn(|_| None),
            next_owner: OwnerToken::first().0,
        }
    }

    /// Hand out a token no other live connection holds.
    pub fn next_owner(&mut self) -> OwnerToken {
        let token = OwnerToken(self.next_owner);
        self.next_owner = self.next_owner.wrapping_add(1).max(1);
        token
    }

    /// Bind `handle` to a fresh socket owned by `owner`.
    ///
    /// Any previous occupant is replaced without cleanup; closing it is the
    /// caller's responsibility.
    pub fn register(
        &mut self,
        handle: SocketHandle,
        kind: SocketKind,
        owner: OwnerToken,
    ) -> Result<(), Error> {
        let slot = self
            .sockets
            .get_mut(handle.index())
            .ok_or(Error::MuxOutOfRange(handle.0 as i32))?;

        if let Some(previous) = slot {
            if previous.owner() != owner {
                warn!("[{}] Replacing registered {:?} socket", handle.0, previous.kind());
            }
        }

        debug!("[{}] Registered {:?} socket", handle.0, kind);
        *slot = Some(Socket::new(kind, owner));
        Ok(())
    }

    /// Free `handle`, but only if it is still owned by `owner`.
    pub fn unregister(&mut self, handle: SocketHandle, owner: OwnerToken) -> bool {
        match self.sockets.get_mut(handle.index()) {
            Some(slot) if slot.as_ref().map(Socket::owner) == Some(owner) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, handle: SocketHandle) -> Option<&Socket> {
        self.sockets.get(handle.index())?.as_ref()
    }

    pub fn get_mut(&mut self, handle: SocketHandle) -> Option<&mut Socket> {
        self.sockets.get_mut(handle.index())?.as_mut()
    }

    /// Socket at `handle`, if `owner` still holds it.
    pub fn owned(&self, handle: SocketHandle, owner: OwnerToken) -> Option<&Socket> {
        self.get(handle).filter(|s| s.owner() == owner)
    }

    pub fn owned_mut(&mut self, handle: SocketHandle, owner: OwnerToken) -> Option<&mut Socket> {
        self.get_mut(handle).filter(|s| s.owner() == owner)
    }

    /// Resolve a mux id parsed from the modem to a registered socket.
    ///
    /// Out of range ids, empty slots and, when `kind` is given, sockets of
    /// another kind all yield `Error::MuxOutOfRange`.
    pub fn route(&mut self, mux: i32, kind: Option<SocketKind>) -> Result<&mut Socket, Error> {
        let handle = SocketHandle::new(mux)?;
        match self.get_mut(handle) {
            Some(socket) if kind.map_or(true, |k| k == socket.kind()) => Ok(socket),
            _ => Err(Error::MuxOutOfRange(mux)),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.sockets.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
