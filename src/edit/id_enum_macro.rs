/// Defines a closed enum whose variants carry a stable wire identifier and a
/// human-readable kind name.
///
/// Unknown identifiers are rejected on deserialization; use `from_id` when the
/// caller wants to report the failure itself.
#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $wire_id:literal : $kind_name:literal
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.id())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_id(&s).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($enum_name),
                        s,
                        Self::all_ids().join(", ")
                    ))
                })
            }
        }

        impl $enum_name {
            /// Stable identifier used on the wire.
            pub fn id(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $wire_id,
                    )*
                }
            }

            /// Lowercase kind name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $kind_name,
                    )*
                }
            }

            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $(
                        $wire_id => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }

            pub fn all_ids() -> Vec<&'static str> {
                Self::all_variants().iter().map(|v| v.id()).collect()
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.id())
            }
        }
    };
}
