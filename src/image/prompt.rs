//! The fixed vehicle swap instruction.

/// Directive prepended to every request. Not configurable.
pub const VEHICLE_SWAP_DIRECTIVE: &str = "Keep the style, lighting and composition of the \
original photo exactly as they are. Change only the vehicle in the photo. Special \
requirement: every wheel of the new vehicle must be made of balls. The balls must be \
perfectly round, glossy, rainbow-coloured and look like hard plastic spheres. Their size \
and proportions must suit the vehicle, matching the wheels in the original photo. Make \
sure the new image has the same aspect ratio as the original.";

/// Builds the instruction for a replacement vehicle description.
pub fn compose_instruction(vehicle: &str) -> String {
    format!(
        "{VEHICLE_SWAP_DIRECTIVE}\nReplace the vehicle with: \"{}\".",
        vehicle.trim()
    )
}
