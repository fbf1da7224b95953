use foundation::bounds::Region;
use tracing::warn;

/// Default padding on each side, as a fraction of the viewport span.
pub const DEFAULT_BUFFER_FRACTION: f64 = 0.5;

/// Pads `viewport` by `fraction` of its height above and below and `fraction`
/// of its width left and right.
///
/// Latitudes are not clamped, so each margin is exactly `fraction` of the
/// span; search backends treat out-of-range latitudes as the pole.
pub fn compute_buffer(viewport: &Region, fraction: f64) -> Region {
    debug_assert!(fraction.is_finite() && fraction >= 0.0);
    let lat_pad = viewport.lat_span() * fraction;
    let lng_pad = viewport.lng_span() * fraction;
    let padded = Region::new(
        viewport.north() + lat_pad,
        viewport.south() - lat_pad,
        viewport.east() + lng_pad,
        viewport.west() - lng_pad,
    );
    match padded {
        Ok(region) => region,
        // Only reachable when the padded edges overflow to infinity.
        Err(err) => {
            debug_assert!(false, "padding {viewport:?} by {fraction} failed: {err}");
            warn!("padding {viewport:?} by {fraction} failed ({err}); fetching the viewport as is");
            *viewport
        }
    }
}
