//! Integration tests and shared fixtures for the mixforge workspace
//!
//! The tests under `tests/` drive the public [`mixforge::Forge`] surface
//! end to end. This library holds the class zoo they share: one class per
//! way an object can be serialized, searched and rebuilt.

pub mod fixtures;
pub mod wire;

#[cfg(test)]
mod tests {
    use super::fixtures::Fixtures;

    #[test]
    fn test_fixture_classes_register_cleanly() {
        let fixtures = Fixtures::new().unwrap();
        let forge = fixtures.forge().unwrap();
        for class in fixtures.classes() {
            assert!(forge.registry().contains(class.key()), "{} not registered", class.key());
        }
    }
}
