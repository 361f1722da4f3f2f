//! Structured answers to "may this action be performed right now".

/// Result of a dry-run check of an action.
///
/// Implementors are plain structs of named boolean flags, one per reason the action could be
/// refused. The same struct is returned by the dry-run and by the re-validation step of the
/// real action so both report identically.
pub trait Eligibility {
    /// Names of the flags that are set.
    fn reasons(&self) -> Vec<&'static str>;

    /// Whether no refusal reason is set.
    fn is_eligible(&self) -> bool {
        self.reasons().is_empty()
    }
}

/// Implements [`Eligibility`] for a struct whose listed fields are refusal flags.
#[macro_export]
macro_rules! impl_eligibility {
    ($ty:ty { $($flag:ident),+ $(,)? }) => {
        impl $crate::eligibility::Eligibility for $ty {
            fn reasons(&self) -> Vec<&'static str> {
                let mut reasons = Vec::new();
                $(
                    if self.$flag {
                        reasons.push(stringify!($flag));
                    }
                )+
                reasons
            }
        }
    };
}
