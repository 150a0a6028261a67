use std::ops::{BitOr, BitOrAssign};

/// Capabilities a canvas grants to the user.
///
/// Five independent bits. `MOVE`, `RESIZE` and `REMOVE` act on the current
/// selection, so they only take effect when `SELECTION` is granted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(u8);

impl Permissions {
    pub const SELECTION: Permissions = Permissions(1 << 0);
    pub const ANNOTATE: Permissions = Permissions(1 << 1);
    pub const MOVE: Permissions = Permissions(1 << 2);
    pub const RESIZE: Permissions = Permissions(1 << 3);
    pub const REMOVE: Permissions = Permissions(1 << 4);

    /// Read-only canvas used to look identities up
    pub fn reference() -> Self {
        Self::SELECTION
    }

    /// Fully editable canvas
    pub fn working() -> Self {
        Self::SELECTION | Self::ANNOTATE | Self::MOVE | Self::RESIZE | Self::REMOVE
    }

    /// Raw bit test, ignoring the dependency on `SELECTION`
    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the capability is actually usable
    pub fn allows(self, capability: Permissions) -> bool {
        if capability == Self::MOVE || capability == Self::RESIZE || capability == Self::REMOVE {
            self.contains(capability | Self::SELECTION)
        } else {
            self.contains(capability)
        }
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Permissions) -> Permissions {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Permissions) {
        self.0 |= rhs.0;
    }
}
