// Size limits shared by every mutation site (gestures, inspector, rehydration).
pub const MIN_ELEMENT_SIZE: f32 = 20.0;
pub const MAX_ELEMENT_SIZE: f32 = 800.0;

/// Clamp a width or height into the allowed range.
pub fn clamp_dimension(value: f32) -> f32 {
    if !value.is_finite() {
        return MIN_ELEMENT_SIZE;
    }
    value.clamp(MIN_ELEMENT_SIZE, MAX_ELEMENT_SIZE)
}
