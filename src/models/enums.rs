use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored or wire string does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
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

str_enum!(MessageRole {
    User => "user",
    Assistant => "assistant",
});

/// Coarse orchestrator phase derived from stage + completion.
str_enum!(Phase {
    Start => "start",
    Collecting => "collecting",
    AwaitingDiagnosis => "awaiting_diagnosis",
    Complete => "complete",
});

str_enum!(SectionKind {
    Paragraph => "paragraph",
    Emphasized => "emphasized",
    List => "list",
});

/// User-triggerable actions offered by the render layer.
str_enum!(Action {
    Submit => "submit",
    RequestDiagnosis => "request_diagnosis",
    RequestSummary => "request_summary",
    ContinueAnyway => "continue_anyway",
    ContinueNow => "continue_now",
    Reset => "reset",
});
