// Screen-space to game-unit distance model, fitted against measured in-game
// distances. Perspective makes targets lower on screen look further away.

/// Fitted parameters of the distance model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceParams {
  pub unit_scale: f64,
  pub v_top: f64,
  pub v_bottom: f64,
  pub k_sep: f64,
  pub max_sep_mult: f64,
}

impl Default for DistanceParams {
  fn default() -> Self {
    Self {
      unit_scale: 1.127_278_936_246_353_1,
      v_top: 0.405_793_097_456_550_07,
      v_bottom: -0.184_712_668_920_282_99,
      k_sep: 0.276_688_816_498_838_6,
      max_sep_mult: 1.327_606_746_839_272_7,
    }
  }
}

pub fn pixel_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
  (a.0 - b.0).hypot(a.1 - b.1)
}

/// Predicted game-unit distance from `player` to `target`, both in screen pixels.
pub fn predict_units(
  params: &DistanceParams,
  screen_height: f64,
  player: (f64, f64),
  target: (f64, f64),
) -> f64 {
  let dy = player.1 - target.1;
  let pixel_dist = pixel_distance(player, target);
  if pixel_dist == 0.0 {
    return 0.0;
  }

  let half = screen_height / 2.0;
  let norm_y = ((player.1 - half) / half).clamp(-1.0, 1.0);
  let t = (norm_y + 1.0) / 2.0;
  let v = params.v_top * (1.0 - t) + params.v_bottom * t;
  let pos_multiplier = 1.0 + v;

  let sep_multiplier = (1.0 + params.k_sep * dy.abs() / pixel_dist).min(params.max_sep_mult);

  pixel_dist * params.unit_scale * pos_multiplier * sep_multiplier
}
