//! Vehicle control corruption for a deteriorated driver.
//!
//! The host writes the driver's real input into [`Vehicle::input`]. Every frame
//! the effective input is rebuilt from it and then corrupted, so nothing done
//! here outlives the frame.

use hecs::{Entity, World};
use rand::Rng;

use crate::chance::FrameChance;
use crate::error::DeteriorationError;
use crate::host::{vehicle_driven_by, Subject, Vehicle, VehicleInput};

/// Failure count at which the primary corruption pass starts.
pub const CORRUPTION_MIN_FAILURES: u32 = 8;
/// Failure count for the terminal extras and the secondary pass.
pub const TERMINAL_MIN_FAILURES: u32 = 9;

pub const FORCED_THROTTLE_PERCENT: f64 = 25.0;
pub const STEERING_JITTER: f32 = 0.3;
/// Speed (m/s) above which straight-line driving also gets jitter.
pub const JITTER_SPEED_THRESHOLD: f32 = 2.0;
pub const STEERING_INVERT_PERCENT: f64 = 15.0;
pub const PHANTOM_THROTTLE_PERCENT: f64 = 10.0;
pub const BRAKE_RELEASE_PERCENT: f64 = 5.0;
pub const STEERING_JOLT_PERCENT: f64 = 8.0;

/// Which rules fired on a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleCorruption {
    pub brake_converted: bool,
    pub forced_throttle: bool,
    pub steering_jitter: bool,
    pub steering_inverted: bool,
    pub phantom_throttle: bool,
    pub brake_released: bool,
    pub steering_jolt: bool,
}

impl VehicleCorruption {
    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

/// Primary pass: pedals swap, steering drifts, and at the terminal stage the
/// wheel may flip outright.
pub fn corrupt_input<R: Rng + ?Sized>(
    input: &mut VehicleInput,
    speed: f32,
    failure_count: u32,
    chance: FrameChance,
    rng: &mut R,
    report: &mut VehicleCorruption,
) {
    if failure_count < CORRUPTION_MIN_FAILURES {
        return;
    }
    let original = *input;

    if original.brake {
        input.brake = false;
        input.throttle = true;
        report.brake_converted = true;
    } else if original.throttle && chance.percent(rng, FORCED_THROTTLE_PERCENT) {
        input.brake = false;
        input.throttle = true;
        report.forced_throttle = true;
    }

    if original.steering.abs() > 0.1 || speed.abs() > JITTER_SPEED_THRESHOLD {
        let jitter = rng.gen_range(-STEERING_JITTER..=STEERING_JITTER);
        input.steering = (original.steering + jitter).clamp(-1.0, 1.0);
        report.steering_jitter = true;
    }

    if failure_count >= TERMINAL_MIN_FAILURES {
        if chance.percent(rng, STEERING_INVERT_PERCENT) {
            input.steering = -original.steering;
            report.steering_inverted = true;
        }
        if chance.percent(rng, PHANTOM_THROTTLE_PERCENT) {
            input.throttle = true;
            report.phantom_throttle = true;
        }
    }
}

/// Secondary pass for a driver still in the vehicle enter/drive animation.
pub fn corrupt_in_animation<R: Rng + ?Sized>(
    input: &mut VehicleInput,
    failure_count: u32,
    chance: FrameChance,
    rng: &mut R,
    report: &mut VehicleCorruption,
) {
    if failure_count < TERMINAL_MIN_FAILURES {
        return;
    }
    if chance.percent(rng, BRAKE_RELEASE_PERCENT) {
        input.brake = false;
        report.brake_released = true;
    }
    if chance.percent(rng, STEERING_JOLT_PERCENT) {
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        input.steering = direction * rng.gen_range(0.5..=1.0);
        report.steering_jolt = true;
    }
}

/// Rebuild and corrupt the effective input of whatever `driver` is driving.
///
/// Returns `Ok(None)` when the driver is not in a vehicle.
pub fn update_driven_vehicle<R: Rng + ?Sized>(
    world: &World,
    driver: Entity,
    failure_count: u32,
    chance: FrameChance,
    rng: &mut R,
) -> Result<Option<VehicleCorruption>, DeteriorationError> {
    let Some(vehicle_entity) = vehicle_driven_by(world, driver) else {
        return Ok(None);
    };
    let in_animation = world.get::<&Subject>(driver)?.in_vehicle_animation;
    let mut vehicle = world.get::<&mut Vehicle>(vehicle_entity)?;

    let mut report = VehicleCorruption::default();
    let mut effective = vehicle.input;
    corrupt_input(&mut effective, vehicle.speed, failure_count, chance, rng, &mut report);
    if in_animation {
        corrupt_in_animation(&mut effective, failure_count, chance, rng, &mut report);
    }
    vehicle.effective = effective;

    if report.any() {
        log::trace!("Vehicle input corrupted: {:?}", report);
    }
    Ok(Some(report))
}

/// Hand the vehicle back its real input, e.g. once corruption is switched off.
pub fn clear_driven_vehicle(world: &World, driver: Entity) -> Result<(), DeteriorationError> {
    if let Some(vehicle_entity) = vehicle_driven_by(world, driver) {
        let mut vehicle = world.get::<&mut Vehicle>(vehicle_entity)?;
        vehicle.effective = vehicle.input;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIALS: usize = 20_000;

    fn frame() -> FrameChance {
        FrameChance::reference_frame()
    }

    fn rate(hits: usize) -> f64 {
        hits as f64 / TRIALS as f64
    }

    #[test]
    fn below_threshold_is_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let original = VehicleInput { steering: 0.7, throttle: false, brake: true };
        let mut input = original;
        let mut report = VehicleCorruption::default();
        corrupt_input(&mut input, 10.0, 7, frame(), &mut rng, &mut report);
        corrupt_in_animation(&mut input, 8, frame(), &mut rng, &mut report);
        assert_eq!(input, original);
        assert!(!report.any());
    }

    #[test]
    fn brake_becomes_throttle() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            let mut input = VehicleInput { steering: 0.0, throttle: false, brake: true };
            let mut report = VehicleCorruption::default();
            corrupt_input(&mut input, 0.0, 8, frame(), &mut rng, &mut report);
            assert!(!input.brake && input.throttle);
            assert!(report.brake_converted);
            assert_eq!(input.steering, 0.0);
        }
    }

    #[test]
    fn throttle_only_forced_a_quarter_of_the_time() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut forced = 0;
        for _ in 0..TRIALS {
            let mut input = VehicleInput { steering: 0.0, throttle: true, brake: false };
            let mut report = VehicleCorruption::default();
            corrupt_input(&mut input, 0.0, 8, frame(), &mut rng, &mut report);
            assert!(input.throttle && !input.brake);
            if report.forced_throttle {
                forced += 1;
            }
        }
        assert!((0.23..0.27).contains(&rate(forced)), "rate = {}", rate(forced));
    }

    #[test]
    fn steering_jitter_is_bounded() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..TRIALS {
            let mut input = VehicleInput { steering: 0.9, throttle: false, brake: false };
            let mut report = VehicleCorruption::default();
            corrupt_input(&mut input, 0.0, 8, frame(), &mut rng, &mut report);
            assert!(report.steering_jitter);
            assert!(input.steering >= 0.6 - 1e-6 && input.steering <= 1.0);
        }
        // Straight and slow: no jitter.
        let mut input = VehicleInput::default();
        let mut report = VehicleCorruption::default();
        corrupt_input(&mut input, 1.0, 8, frame(), &mut rng, &mut report);
        assert!(!report.steering_jitter);
        // Straight but fast: jitter.
        corrupt_input(&mut input, 5.0, 8, frame(), &mut rng, &mut report);
        assert!(report.steering_jitter);
    }

    #[test]
    fn terminal_inversion_and_phantom_rates() {
        let mut rng = StdRng::seed_from_u64(5);
        let (mut inverted, mut phantom) = (0, 0);
        for _ in 0..TRIALS {
            let mut input = VehicleInput { steering: 0.5, throttle: false, brake: false };
            let mut report = VehicleCorruption::default();
            corrupt_input(&mut input, 0.0, 9, frame(), &mut rng, &mut report);
            if report.steering_inverted {
                inverted += 1;
                assert_eq!(input.steering, -0.5);
            }
            if report.phantom_throttle {
                phantom += 1;
                assert!(input.throttle);
            }
        }
        assert!((0.13..0.17).contains(&rate(inverted)), "inverted = {}", rate(inverted));
        assert!((0.085..0.115).contains(&rate(phantom)), "phantom = {}", rate(phantom));
    }

    #[test]
    fn animation_pass_rates() {
        let mut rng = StdRng::seed_from_u64(6);
        let (mut released, mut jolts) = (0, 0);
        for _ in 0..TRIALS {
            let mut input = VehicleInput { steering: 0.0, throttle: false, brake: true };
            let mut report = VehicleCorruption::default();
            corrupt_in_animation(&mut input, 9, frame(), &mut rng, &mut report);
            if report.brake_released {
                released += 1;
                assert!(!input.brake);
            }
            if report.steering_jolt {
                jolts += 1;
                assert!((0.5..=1.0).contains(&input.steering.abs()));
            }
        }
        assert!((0.04..0.06).contains(&rate(released)), "released = {}", rate(released));
        assert!((0.068..0.092).contains(&rate(jolts)), "jolts = {}", rate(jolts));
    }

    #[test]
    fn effective_input_is_rebuilt_every_frame() {
        let mut world = World::new();
        let driver = world.spawn((Subject::new(4.6, 11.0),));
        let car = world.spawn((Vehicle {
            driver: Some(driver),
            input: VehicleInput { steering: 0.0, throttle: false, brake: true },
            ..Default::default()
        },));
        let mut rng = StdRng::seed_from_u64(7);

        let report = update_driven_vehicle(&world, driver, 8, frame(), &mut rng).unwrap().unwrap();
        assert!(report.brake_converted);
        {
            let vehicle = world.get::<&Vehicle>(car).unwrap();
            assert!(vehicle.effective.throttle && !vehicle.effective.brake);
            assert!(vehicle.input.brake && !vehicle.input.throttle);
        }

        // Corruption switched off: the raw input comes straight through.
        update_driven_vehicle(&world, driver, 3, frame(), &mut rng).unwrap();
        let vehicle = world.get::<&Vehicle>(car).unwrap();
        assert_eq!(vehicle.effective, vehicle.input);
    }

    #[test]
    fn driver_without_vehicle_is_skipped() {
        let mut world = World::new();
        let driver = world.spawn((Subject::new(4.6, 11.0),));
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(update_driven_vehicle(&world, driver, 9, frame(), &mut rng).unwrap(), None);
    }
}
