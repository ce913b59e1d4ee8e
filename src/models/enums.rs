use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Patient => "patient",
});

str_enum!(Gender {
    Male => "M",
    Female => "F",
});

impl Role {
    /// Lookup order used by authentication.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Patient];

    /// Identity table backing this role.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Admin => "admins",
            Self::Doctor => "doctors",
            Self::Patient => "patients",
        }
    }

    /// Landing dashboard for this role.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Admin => "/admin/dashboard",
            Self::Doctor => "/doctor/dashboard",
            Self::Patient => "/patient/dashboard",
        }
    }
}
