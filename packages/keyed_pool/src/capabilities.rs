use std::any::Any;

use crate::PlacementError;

/// Applies a placement to a pooled instance as part of
/// [`PoolRegistry::acquire_at()`][crate::PoolRegistry::acquire_at].
///
/// The pool is not aware of what a placement means. For a game object it might be a position and
/// rotation, for a connection an endpoint address. The type parameter allows one instance type
/// to accept multiple kinds of placement.
///
/// # Example
///
/// ```
/// use keyed_pool::{Place, PlacementError};
///
/// #[derive(Default)]
/// struct Sprite {
///     x: f32,
///     y: f32,
/// }
///
/// impl Place<(f32, f32)> for Sprite {
///     fn place(&mut self, (x, y): (f32, f32)) -> Result<(), PlacementError> {
///         self.x = x;
///         self.y = y;
///         Ok(())
///     }
/// }
/// ```
pub trait Place<P> {
    /// Applies `placement` to the instance.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError`] if the instance cannot accept the placement.
    fn place(&mut self, placement: P) -> Result<(), PlacementError>;
}

/// Exposes optional named features of a pooled instance.
///
/// The pool itself is ignorant of what features an instance offers. It only forwards a feature
/// query to the instance and reports [`PoolError::FeatureNotFound`][crate::PoolError::FeatureNotFound]
/// when the instance returns `None`.
///
/// # Example
///
/// ```
/// use std::any::Any;
///
/// use keyed_pool::Features;
///
/// struct Health(u32);
///
/// struct Enemy {
///     health: Health,
/// }
///
/// impl Features for Enemy {
///     fn feature(&self, id: &str) -> Option<&dyn Any> {
///         match id {
///             "health" => Some(&self.health),
///             _ => None,
///         }
///     }
///
///     fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any> {
///         match id {
///             "health" => Some(&mut self.health),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Features {
    /// Returns the feature named `id`, if the instance has one.
    fn feature(&self, id: &str) -> Option<&dyn Any>;

    /// Returns exclusive access to the feature named `id`, if the instance has one.
    fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Turret {
        ammo: u32,
        label: String,
        heading: f32,
    }

    impl Features for Turret {
        fn feature(&self, id: &str) -> Option<&dyn Any> {
            match id {
                "ammo" => Some(&self.ammo),
                "label" => Some(&self.label),
                _ => None,
            }
        }

        fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any> {
            match id {
                "ammo" => Some(&mut self.ammo),
                "label" => Some(&mut self.label),
                _ => None,
            }
        }
    }

    impl Place<f32> for Turret {
        fn place(&mut self, heading: f32) -> Result<(), PlacementError> {
            if !(0.0..360.0).contains(&heading) {
                return Err(PlacementError::new("heading out of range"));
            }

            self.heading = heading;
            Ok(())
        }
    }

    fn turret() -> Turret {
        Turret {
            ammo: 10,
            label: "north".to_string(),
            heading: 0.0,
        }
    }

    #[test]
    fn features_downcast_to_concrete_types() {
        let turret = turret();

        let ammo = turret.feature("ammo").and_then(|f| f.downcast_ref::<u32>());
        assert_eq!(ammo, Some(&10));

        let label = turret
            .feature("label")
            .and_then(|f| f.downcast_ref::<String>());
        assert_eq!(label.map(String::as_str), Some("north"));

        assert!(turret.feature("shield").is_none());
    }

    #[test]
    fn feature_mut_allows_modification() {
        let mut turret = turret();

        if let Some(ammo) = turret
            .feature_mut("ammo")
            .and_then(|f| f.downcast_mut::<u32>())
        {
            *ammo = 3;
        }

        assert_eq!(turret.ammo, 3);
    }

    #[test]
    fn place_validates_input() {
        let mut turret = turret();

        turret.place(90.0).unwrap();
        assert!((turret.heading - 90.0).abs() < f32::EPSILON);

        turret.place(400.0).unwrap_err();
        assert!((turret.heading - 90.0).abs() < f32::EPSILON);
    }
}
