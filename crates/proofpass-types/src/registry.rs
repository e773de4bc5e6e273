//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each pluggable module (storage, account, delivery) provides a `Registry`
/// struct implementing this trait, declaring the name it is configured under
/// and the factory function that builds it.
pub trait ImplementationRegistry {
	/// The name used in configuration files, e.g. "file" for
	/// `storage.implementations.file` or "local" for `account.implementations.local`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
