//! Predicate permission codec.
//!
//! A predicate ACL is carried on the wire as a 3-bit integer:
//!
//! | bit | value | right  |
//! |-----|-------|--------|
//! | 2   | 4     | read   |
//! | 1   | 2     | write  |
//! | 0   | 1     | modify |
//!
//! [`Rights`] is the semantic form used for validation and display;
//! [`Permission`] is the validated wire form.
//!
//! ```rust
//! use dgacl_core::permission::{Permission, Rights, decode, encode};
//!
//! let perm = encode(true, true, false);
//! assert_eq!(perm.value(), 6);
//! assert_eq!(decode(6).unwrap(), Rights::new(true, true, false));
//! assert_eq!(perm.to_string(), "rw-");
//! assert_eq!("r-m".parse::<Permission>().unwrap().value(), 5);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const READ: u8 = 0b100;
const WRITE: u8 = 0b010;
const MODIFY: u8 = 0b001;

/// Largest valid permission value.
pub const MAX_PERMISSION: u8 = READ | WRITE | MODIFY;

/// The three independent rights a group can hold on a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rights {
    /// May query the predicate.
    pub read: bool,
    /// May mutate values of the predicate.
    pub write: bool,
    /// May alter the predicate's schema.
    pub modify: bool,
}

impl Rights {
    /// Build a rights triple.
    pub fn new(read: bool, write: bool, modify: bool) -> Self {
        Self {
            read,
            write,
            modify,
        }
    }

    /// Wire form of these rights.
    pub fn permission(self) -> Permission {
        encode(self.read, self.write, self.modify)
    }
}

impl fmt::Display for Rights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.modify, 'm')
        )
    }
}

/// A validated permission value in `[0, 7]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permission(u8);

impl Permission {
    /// Validate an integer as a permission value.
    pub fn new(value: i64) -> Result<Self> {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_PERMISSION => Ok(Self(v)),
            _ => Err(Error::invalid_permission(value)),
        }
    }

    /// The integer sent on the wire.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Semantic form of this value.
    pub fn rights(self) -> Rights {
        Rights {
            read: self.0 & READ != 0,
            write: self.0 & WRITE != 0,
            modify: self.0 & MODIFY != 0,
        }
    }
}

impl From<Rights> for Permission {
    fn from(rights: Rights) -> Self {
        rights.permission()
    }
}

impl From<Permission> for Rights {
    fn from(perm: Permission) -> Self {
        perm.rights()
    }
}

impl TryFrom<i64> for Permission {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rights().fmt(f)
    }
}

/// Parses either a decimal integer (`"6"`) or the symbolic form (`"rw-"`).
impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Self::new(n);
        }
        parse_symbolic(s)
            .map(Rights::permission)
            .ok_or_else(|| Error::invalid_permission(s))
    }
}

fn parse_symbolic(s: &str) -> Option<Rights> {
    let chars: Vec<char> = s.chars().collect();
    let [r, w, m] = chars.as_slice() else {
        return None;
    };
    let slot = |c: char, expected: char| match c {
        '-' => Some(false),
        c if c == expected => Some(true),
        _ => None,
    };
    Some(Rights {
        read: slot(*r, 'r')?,
        write: slot(*w, 'w')?,
        modify: slot(*m, 'm')?,
    })
}

/// Encode a rights triple as its wire value.
pub fn encode(read: bool, write: bool, modify: bool) -> Permission {
    let mut v = 0;
    if read {
        v |= READ;
    }
    if write {
        v |= WRITE;
    }
    if modify {
        v |= MODIFY;
    }
    Permission(v)
}

/// Decode a wire value into its rights triple.
///
/// Fails with [`Error::InvalidPermission`] for anything outside `[0, 7]`.
pub fn decode(value: i64) -> Result<Rights> {
    Permission::new(value).map(Permission::rights)
}
