// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-channel listener traits.
//!
//! A [`ConfigListener`] receives the full new content of a document every time it
//! changes. Listeners created by the binder also implement [`RefreshableTarget`],
//! which lets a redeployed bean take over an existing subscription instead of
//! adding a second one.

use crate::domain::Result;
use std::any::Any;
use std::sync::Arc;

/// A type-erased bean handle.
///
/// Binder-created listeners downcast this back to their concrete bean type when a
/// target is rebound.
pub type AnyBean = Arc<dyn Any + Send + Sync>;

/// Receives document content from a config client's push channel.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::ports::ConfigListener;
/// use nacos_binder::domain::Result;
/// use parking_lot::Mutex;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ConfigListener for Recorder {
///     fn receive_config_info(&self, content: &str) -> Result<()> {
///         self.0.lock().push(content.to_string());
///         Ok(())
///     }
/// }
///
/// let recorder = Recorder::default();
/// recorder.receive_config_info("timeout=30").unwrap();
/// assert_eq!(recorder.0.lock().len(), 1);
/// ```
pub trait ConfigListener: Send + Sync {
    /// Handles the complete new content of the document.
    ///
    /// An error is reported back to the push channel, which logs it. The listener
    /// must keep its previous state when it fails.
    fn receive_config_info(&self, content: &str) -> Result<()>;

    /// Short description used in log messages.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// A listener whose delivery target can be swapped.
///
/// `target` returns `None` once the bound bean has been dropped.
pub trait RefreshableTarget: Send + Sync {
    /// The bean deliveries currently go to.
    fn target(&self) -> Option<AnyBean>;

    /// Re-points deliveries to `target`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TargetTypeMismatch` if `target` is not of the bean
    /// type the listener was built for.
    fn set_target(&self, target: AnyBean) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigError;
    use parking_lot::Mutex;
    use std::sync::Weak;

    struct Holder {
        target: Mutex<Weak<Mutex<i32>>>,
    }

    impl RefreshableTarget for Holder {
        fn target(&self) -> Option<AnyBean> {
            self.target.lock().upgrade().map(|t| t as AnyBean)
        }

        fn set_target(&self, target: AnyBean) -> Result<()> {
            let bean = target
                .downcast::<Mutex<i32>>()
                .map_err(|_| ConfigError::TargetTypeMismatch {
                    registration_key: "holder".to_string(),
                    expected: "Mutex<i32>".to_string(),
                })?;
            *self.target.lock() = Arc::downgrade(&bean);
            Ok(())
        }
    }

    struct Recorder(Mutex<Vec<String>>);

    impl ConfigListener for Recorder {
        fn receive_config_info(&self, content: &str) -> Result<()> {
            self.0.lock().push(content.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_default_describe_names_type() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        assert!(recorder.describe().ends_with("Recorder"));
    }

    #[test]
    fn test_set_target_rebinds() {
        let first = Arc::new(Mutex::new(1));
        let holder = Holder {
            target: Mutex::new(Arc::downgrade(&first)),
        };

        let second = Arc::new(Mutex::new(2));
        holder.set_target(second.clone()).unwrap();

        let current = holder.target().unwrap().downcast::<Mutex<i32>>().unwrap();
        assert_eq!(*current.lock(), 2);
    }

    #[test]
    fn test_set_target_wrong_type() {
        let holder = Holder {
            target: Mutex::new(Weak::new()),
        };
        let result = holder.set_target(Arc::new("not a counter".to_string()));
        assert!(matches!(result, Err(ConfigError::TargetTypeMismatch { .. })));
    }

    #[test]
    fn test_target_gone_after_drop() {
        let bean = Arc::new(Mutex::new(1));
        let holder = Holder {
            target: Mutex::new(Arc::downgrade(&bean)),
        };
        drop(bean);
        assert!(holder.target().is_none());
    }
}
