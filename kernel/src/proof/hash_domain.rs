//! Domain prefixes for [`canonical_hash`](super::hash::canonical_hash).
//!
//! Each hashed surface gets its own NUL-terminated prefix, so a manifest and
//! a registry listing with identical bytes never share a digest. Prefixes are
//! declared once in the `hash_domains!` table below.

macro_rules! hash_domains {
    (
        $(
            $(#[$doc:meta])*
            $variant:ident => $prefix:literal
        ),+ $(,)?
    ) => {
        /// Which surface a digest covers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $( $(#[$doc])* $variant, )+
        }

        impl HashDomain {
            /// Every domain, in table order.
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

            /// Prefix bytes fed to the hasher, including the trailing NUL.
            #[must_use]
            pub const fn as_bytes(self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $prefix ),+
                }
            }

            /// Variant name, for diagnostics.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant) ),+
                }
            }
        }
    };
}

hash_domains! {
    /// `KernelManifest` bytes of one kernel.
    KernelManifest => b"EVALKERN::KERNEL_MANIFEST::V1\0",

    /// `KernelRegistry` listing (name → manifest digest).
    KernelRegistry => b"EVALKERN::KERNEL_REGISTRY::V1\0",
}

impl std::fmt::Display for HashDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
