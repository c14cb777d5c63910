//! Enumerated option values.

use std::fmt;

use serde::Serialize;

/// Declares a closed set of textual choices as a Rust enum.
///
/// The generated type carries `CHOICES` (the accepted spellings, in
/// declaration order, for the descriptor table) plus `as_str` and
/// `from_choice` conversions.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Accepted spellings.
            pub const CHOICES: &'static [&'static str] = &[$($text),+];

            /// Canonical spelling.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Parse a canonical spelling.
            pub fn from_choice(text: &str) -> Option<Self> {
                match text {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    /// Tri-state switch used by `banner` and `color`.
    Switch {
        /// Decide from the terminal.
        Auto => "auto",
        /// Always on.
        Yes => "yes",
        /// Always off.
        No => "no",
    }
}

choice_enum! {
    /// Compiler mode.
    CompileMode {
        /// Compile normally.
        Yes => "yes",
        /// Interpret only.
        No => "no",
        /// Compile everything ahead of use.
        All => "all",
        /// Compile as little as possible.
        Min => "min",
    }
}

choice_enum! {
    /// Bounds checking policy.
    CheckBounds {
        /// Respect annotations in code.
        Default => "default",
        /// Always check.
        Yes => "yes",
        /// Never check.
        No => "no",
        /// Check unless proven safe.
        Auto => "auto",
    }
}

choice_enum! {
    /// Deprecation warning policy.
    DepWarn {
        /// Print warnings.
        Yes => "yes",
        /// Stay silent.
        No => "no",
        /// Turn warnings into errors.
        Error => "error",
    }
}

choice_enum! {
    /// Whether precompiled modules are used.
    CompiledModules {
        /// Use and create caches.
        Yes => "yes",
        /// Ignore caches.
        No => "no",
        /// Use existing caches, never create new ones.
        Existing => "existing",
        /// Fail when a cache is missing.
        Strict => "strict",
    }
}

choice_enum! {
    /// Code trimming for output images.
    TrimMode {
        /// No trimming.
        No => "no",
        /// Trim only provably unreachable code.
        Safe => "safe",
        /// Trim aggressively.
        Unsafe => "unsafe",
        /// Trim aggressively and warn about dynamic calls.
        UnsafeWarn => "unsafe-warn",
    }
}

choice_enum! {
    /// Scope of coverage or allocation tracking.
    Tracking {
        /// Nothing tracked.
        None => "none",
        /// User code only.
        User => "user",
        /// Everything.
        All => "all",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_spellings() {
        for choice in TrimMode::CHOICES {
            let mode = TrimMode::from_choice(choice).unwrap();
            assert_eq!(mode.as_str(), *choice);
        }
    }

    #[test]
    fn test_unknown_spelling() {
        assert_eq!(Switch::from_choice("maybe"), None);
        assert_eq!(Switch::from_choice("YES"), None);
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(TrimMode::UnsafeWarn.to_string(), "unsafe-warn");
        assert_eq!(
            serde_json::to_string(&CompiledModules::Existing).unwrap(),
            "\"existing\""
        );
    }

    #[test]
    fn test_choice_order() {
        assert_eq!(Tracking::CHOICES, &["none", "user", "all"]);
    }
}
