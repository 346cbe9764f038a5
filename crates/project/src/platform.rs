//! Platform-library membership.
//!
//! Packages like `java.*` can be referenced everywhere without any
//! repository module declaring them. The set of platform libraries is
//! closed and enumerable, so it is a sum type evaluated in priority order
//! rather than an open plugin interface, and it travels as session
//! configuration instead of process-global state.

/// One platform library, answering "does this package belong to me".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformLibrary {
    JavaSe,
    JakartaEe,
    JdkInternal,
}

impl PlatformLibrary {
    const fn prefixes(self) -> &'static [&'static str] {
        match self {
            Self::JavaSe => &["java."],
            Self::JakartaEe => &["javax.", "jakarta."],
            Self::JdkInternal => &["jdk.", "sun.", "com.sun."],
        }
    }

    pub fn owns_package(self, package: &str) -> bool {
        self.prefixes()
            .iter()
            .any(|prefix| package.starts_with(prefix))
    }
}

/// Session-scoped platform-library configuration, checked in order.
#[derive(Debug, Clone)]
pub struct PlatformLibraries {
    libraries: Vec<PlatformLibrary>,
}

impl PlatformLibraries {
    /// The usual JVM set.
    pub fn standard() -> Self {
        Self {
            libraries: vec![
                PlatformLibrary::JavaSe,
                PlatformLibrary::JakartaEe,
                PlatformLibrary::JdkInternal,
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            libraries: Vec::new(),
        }
    }

    pub fn owner_of(&self, package: &str) -> Option<PlatformLibrary> {
        self.libraries
            .iter()
            .copied()
            .find(|library| library.owns_package(package))
    }

    /// True when a platform library owns `package`; such symbols never have
    /// an in-repository definition.
    pub fn owns(&self, package: &str) -> bool {
        self.owner_of(package).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let libraries = PlatformLibraries::standard();
        assert_eq!(libraries.owner_of("java.util"), Some(PlatformLibrary::JavaSe));
        assert_eq!(
            libraries.owner_of("javax.annotation"),
            Some(PlatformLibrary::JakartaEe)
        );
        assert_eq!(
            libraries.owner_of("com.sun.tools"),
            Some(PlatformLibrary::JdkInternal)
        );
        assert_eq!(libraries.owner_of("com.acme.core"), None);
    }

    #[test]
    fn test_empty_owns_nothing() {
        assert!(!PlatformLibraries::empty().owns("java.util"));
    }
}
