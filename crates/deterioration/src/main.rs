//! deterioration-sim: headless scripted session driving the deterioration engine.

use anyhow::Result;
use deterioration::config::{AudioCueConfig, CONFIG_FILE};
use deterioration::host::{
    spawn_subject, HudClock, Inventory, ItemDef, Subject, TextElement, Vehicle, VehicleInput, WorldLabel,
};
use deterioration::{
    AudioCue, AudioOut, DeteriorationConfig, DeteriorationEngine, PostProcessLevels, Presentation,
    RecordingPresentation, RoundOutcome, ShakeKind,
};
use engine_core::{Health, Time};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Headless presentation that plays cues through kira when an output device and
/// cue files are available, and records everything else.
struct SimPresentation {
    recording: RecordingPresentation,
    audio: Option<audio::AudioSystem>,
}

impl SimPresentation {
    fn new(cues: &AudioCueConfig) -> Self {
        Self {
            recording: RecordingPresentation::default(),
            audio: open_audio(cues),
        }
    }

    /// Forget one-shot cues that finished during the frame.
    fn end_frame(&mut self) {
        if let Some(system) = self.audio.as_mut() {
            system.cleanup();
        }
    }

    fn silence(&mut self) {
        if let Some(system) = self.audio.as_mut() {
            system.stop_all();
        }
    }
}

fn open_audio(cues: &AudioCueConfig) -> Option<audio::AudioSystem> {
    if cues.tinnitus.is_none() && cues.heartbeat.is_none() {
        return None;
    }
    let mut system = match audio::AudioSystem::new() {
        Ok(system) => system,
        Err(e) => {
            log::warn!("Audio unavailable, running silent: {}", e);
            return None;
        }
    };
    for (cue, path) in [(AudioCue::Tinnitus, &cues.tinnitus), (AudioCue::Heartbeat, &cues.heartbeat)] {
        if let Some(path) = path {
            if let Err(e) = system.load_sound(cue.name(), path) {
                log::warn!("Could not load {} cue from {:?}: {}", cue.name(), path, e);
            }
        }
    }
    Some(system)
}

impl Presentation for SimPresentation {
    fn set_post_process(&mut self, levels: PostProcessLevels) {
        self.recording.set_post_process(levels);
    }

    fn reset_post_process(&mut self) {
        self.recording.reset_post_process();
    }

    fn chromatic_aberration(&self) -> Option<f32> {
        self.recording.chromatic_aberration()
    }

    fn override_chromatic_aberration(&mut self, intensity: f32) {
        self.recording.override_chromatic_aberration(intensity);
    }

    fn shake_camera(&mut self, kind: ShakeKind) {
        self.recording.shake_camera(kind);
    }

    fn set_flash_weight(&mut self, weight: f32) {
        self.recording.set_flash_weight(weight);
    }

    fn hud_alpha(&self) -> Option<f32> {
        self.recording.hud_alpha()
    }

    fn set_hud_alpha(&mut self, alpha: f32) {
        self.recording.set_hud_alpha(alpha);
    }

    fn audio(&mut self) -> Option<&mut dyn AudioOut> {
        match self.audio.as_mut() {
            Some(system) => Some(system as &mut dyn AudioOut),
            None => self.recording.audio(),
        }
    }
}

/// Entities the script pokes at directly.
struct Scene {
    subject: Entity,
    vehicle: Entity,
    clock: Entity,
}

fn build_world(world: &mut World) -> Scene {
    let subject = spawn_subject(world, 4.6, 11.0);

    for header in ["Main Entrance", "Fire Exit", "Apparatus", "Breaker Box", "Ship"] {
        world.spawn((WorldLabel { header: header.to_string() },));
    }
    world.spawn((TextElement { name: "Poster_Hallway".into(), text: "Work hard for the Company".into() },));
    world.spawn((TextElement { name: "Billboard".into(), text: "Buy one shovel, get one free".into() },));
    world.spawn((TextElement { name: "QuotaLabel".into(), text: "Profit quota".into() },));

    let items = [
        world.spawn((ItemDef::new("Flashlight", &["Toggle light : [RMB]"]),)),
        world.spawn((ItemDef::new("Shovel", &["Swing : [RMB]", "Drop : [G]"]),)),
        world.spawn((ItemDef::new("Walkie-talkie", &["Speak : [Q]", "Power : [RMB]"]),)),
        world.spawn((ItemDef::new("Boombox", &["Play : [RMB]"]),)),
        world.spawn((ItemDef::new("Key", &["Use : [E]"]),)),
    ];
    if let Ok(mut inventory) = world.get::<&mut Inventory>(subject) {
        inventory.slots = vec![Some(items[0]), Some(items[1]), None, None];
    }

    let vehicle = world.spawn((Vehicle::default(),));
    let clock = world.spawn((HudClock { text: "8:00 AM".into() },));
    Scene { subject, vehicle, clock }
}

/// Host-side clock text for a number of in-game minutes since 8:00 AM.
fn clock_text(minutes: u32) -> String {
    let total = (8 * 60 + minutes) % (24 * 60);
    let (hour, minute) = (total / 60, total % 60);
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display, minute, if hour < 12 { "AM" } else { "PM" })
}

fn set_driving(world: &World, scene: &Scene, driving: bool, rng: &mut StdRng) -> Result<()> {
    let mut vehicle = world.get::<&mut Vehicle>(scene.vehicle)?;
    if driving {
        vehicle.driver = Some(scene.subject);
        vehicle.input = VehicleInput {
            steering: rng.gen_range(-0.5..=0.5),
            throttle: rng.gen_bool(0.7),
            brake: rng.gen_bool(0.2),
        };
        vehicle.speed = rng.gen_range(0.0..12.0);
    } else {
        vehicle.driver = None;
        vehicle.speed = 0.0;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DeteriorationConfig::load();
    if !DeteriorationConfig::file_exists() {
        log::info!("No {} found, writing defaults", CONFIG_FILE);
        config.save();
    }
    log::info!("Starting deterioration-sim ({} rounds)", config.demo.rounds);

    let mut world = World::new();
    let scene = build_world(&mut world);
    let mut presentation = SimPresentation::new(&config.audio);
    let mut engine = DeteriorationEngine::new(&config);
    let mut script_rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    let mut time = Time::new();
    let dt = config.demo.fixed_dt.max(1.0e-4);
    let frames_per_round = (config.demo.round_seconds / dt).ceil() as u32;

    for round in 1..=config.demo.rounds {
        let dies = script_rng.gen_bool(config.demo.death_chance.clamp(0.0, 1.0));
        let death_frame = script_rng.gen_range(frames_per_round / 4..frames_per_round.max(2));
        {
            let mut subject = world.get::<&mut Subject>(scene.subject)?;
            subject.alive = true;
        }
        {
            let mut health = world.get::<&mut Health>(scene.subject)?;
            let max = health.max;
            health.heal(max);
        }

        for frame in 0..frames_per_round {
            time.advance(dt);
            let seconds = frame as f32 * dt;

            {
                let mut subject = world.get::<&mut Subject>(scene.subject)?;
                subject.is_sprinting = (seconds % 20.0) < 9.0;
                subject.in_vehicle_animation = (seconds % 30.0) < 1.0;
            }
            if frame % (1.0 / dt).max(1.0) as u32 == 0 {
                world.get::<&mut HudClock>(scene.clock)?.text = clock_text((seconds / 2.0) as u32);
            }
            set_driving(&world, &scene, frame > frames_per_round / 2, &mut script_rng)?;

            engine.update(&world, &mut presentation, &time);
            engine.update_vehicle(&world, &time);
            presentation.end_frame();

            let health_gone = world.get::<&Health>(scene.subject)?.is_dead();
            if (dies && frame == death_frame) || health_gone {
                world.get::<&mut Subject>(scene.subject)?.alive = false;
                engine.on_subject_death();
                break;
            }
        }

        let level = if round % 5 == 0 { "LiquidationLevel" } else { "Experimentation" };
        engine.on_round_complete(RoundOutcome::from_level_name(level));

        let subject = world.get::<&Subject>(scene.subject)?;
        let health = world.get::<&Health>(scene.subject)?;
        log::info!(
            "Round {:>2} on {:<16} failures {} | highest {:?} | speed {:.2} | health {:.0}% | clock offset {:+} min | {} texts held",
            round,
            level,
            engine.failure_count(),
            engine.severity().flags().highest(),
            subject.movement_speed,
            health.percentage() * 100.0,
            engine.clock_offset_minutes(),
            engine.store().len(),
        );
    }

    let shakes = presentation.recording.shakes.len();
    engine.reset(&world, &mut presentation);
    engine.reset(&world, &mut presentation);
    presentation.silence();
    let subject = world.get::<&Subject>(scene.subject)?;
    log::info!(
        "Session over after {:.0}s ({} frames): {} camera shakes requested, subject speed back to {:.2}",
        time.elapsed_seconds(),
        time.frame_count(),
        shakes,
        subject.movement_speed
    );
    Ok(())
}
