//! Cadenced corruption of world text, item names and tooltips.

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{report, DeteriorationError};
use crate::host::{Inventory, ItemDef, TextElement, WorldLabel};
use crate::store::{CorruptionStore, TextSlot};

pub const WORLD_TEXT_MIN_FAILURES: u32 = 3;
pub const TOOLTIP_MIN_FAILURES: u32 = 4;
/// From here on tooltips are shuffled once instead of corrupted.
pub const SHUFFLE_MIN_FAILURES: u32 = 8;

pub fn world_text_interval(failure_count: u32) -> f32 {
    (8.0 - 0.5 * failure_count as f32).max(2.0)
}

pub fn tooltip_interval(failure_count: u32) -> f32 {
    (15.0 - 0.8 * failure_count as f32).max(5.0)
}

fn scaled(base: f32, per_failure: f32, max: f32, failure_count: u32) -> f32 {
    (base + per_failure * failure_count as f32).clamp(base, max)
}

pub fn label_ratio(f: u32) -> f32 {
    scaled(0.1, 0.05, 0.6, f)
}

pub fn signage_ratio(f: u32) -> f32 {
    scaled(0.05, 0.025, 0.3, f)
}

pub fn item_name_ratio(f: u32) -> f32 {
    scaled(0.03, 0.02, 0.25, f)
}

pub fn tooltip_ratio(f: u32) -> f32 {
    scaled(0.08, 0.04, 0.5, f)
}

pub fn held_name_ratio(f: u32) -> f32 {
    scaled(0.05, 0.03, 0.4, f)
}

pub fn held_tooltip_ratio(f: u32) -> f32 {
    scaled(0.1, 0.05, 0.6, f)
}

/// Chance that a held item is hit on a tooltip pass.
pub fn held_item_chance(f: u32) -> f64 {
    (0.08 * f64::from(f)).min(1.0)
}

#[derive(Debug, Clone, Default)]
pub struct TextCorruptor {
    world_text_timer: f32,
    tooltip_timer: f32,
    shuffled: bool,
}

impl TextCorruptor {
    pub fn has_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Corrupt one label and one sign every [`world_text_interval`] seconds.
    /// Returns true on frames where the cadence fired.
    pub fn update_world_text<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        store: &mut CorruptionStore,
        failure_count: u32,
        dt: f32,
        rng: &mut R,
    ) -> bool {
        if failure_count < WORLD_TEXT_MIN_FAILURES {
            return false;
        }
        self.world_text_timer += dt;
        if self.world_text_timer < world_text_interval(failure_count) {
            return false;
        }
        self.world_text_timer = 0.0;

        report("corrupt world label", corrupt_random_label(world, store, failure_count, rng).map(drop));
        report("corrupt signage", corrupt_random_signage(world, store, failure_count, rng).map(drop));
        true
    }

    /// Tooltip cadence between 4 and 7 failures; the one-shot shuffle from 8.
    /// Returns true on frames where something fired.
    pub fn update_tooltips<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        store: &mut CorruptionStore,
        subject: Entity,
        failure_count: u32,
        dt: f32,
        rng: &mut R,
    ) -> bool {
        if failure_count >= SHUFFLE_MIN_FAILURES {
            if self.shuffled {
                return false;
            }
            // Set before shuffling so a failure cannot make it fire again.
            self.shuffled = true;
            match shuffle_all_tooltips(world, store, rng) {
                Ok(count) => log::info!("Shuffled tooltips for {} items", count),
                Err(e) => log::error!("Tooltip shuffle failed: {}", e),
            }
            return true;
        }
        if failure_count < TOOLTIP_MIN_FAILURES {
            return false;
        }

        self.tooltip_timer += dt;
        if self.tooltip_timer < tooltip_interval(failure_count) {
            return false;
        }
        self.tooltip_timer = 0.0;

        report("corrupt item tooltip", corrupt_random_item(world, store, failure_count, rng).map(drop));
        report("corrupt held items", corrupt_held_items(world, store, subject, failure_count, rng).map(drop));
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Corrupt one random world label. Returns the label hit, if any.
pub fn corrupt_random_label<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    failure_count: u32,
    rng: &mut R,
) -> Result<Option<Entity>, DeteriorationError> {
    let labels: Vec<Entity> = world.query::<&WorldLabel>().iter().map(|(e, _)| e).collect();
    let Some(&label) = labels.choose(rng) else {
        return Ok(None);
    };
    let hit = store.corrupt_text(world, TextSlot::Label, label, label_ratio(failure_count), rng)?;
    Ok(hit.then_some(label))
}

/// Corrupt one random signage element. Already corrupted signs stay candidates
/// even if corruption broke the words that made them look like signage.
pub fn corrupt_random_signage<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    failure_count: u32,
    rng: &mut R,
) -> Result<Option<Entity>, DeteriorationError> {
    let signs: Vec<Entity> = world
        .query::<&TextElement>()
        .iter()
        .filter(|(e, element)| {
            element.is_signage() || store.original_text(TextSlot::Signage, *e).is_some()
        })
        .map(|(e, _)| e)
        .collect();
    let Some(&sign) = signs.choose(rng) else {
        return Ok(None);
    };
    let hit = store.corrupt_text(world, TextSlot::Signage, sign, signage_ratio(failure_count), rng)?;
    Ok(hit.then_some(sign))
}

fn corrupt_item<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    item: Entity,
    name_ratio: f32,
    tooltip_ratio: f32,
    rng: &mut R,
) -> Result<(), DeteriorationError> {
    // Capture both before touching either.
    store.capture_text(world, TextSlot::ItemName, item)?;
    store.capture_tooltips(world, item)?;
    store.corrupt_text(world, TextSlot::ItemName, item, name_ratio, rng)?;
    store.corrupt_tooltips(world, item, tooltip_ratio, rng)?;
    Ok(())
}

/// Lightly corrupt one random item's name and tooltips.
pub fn corrupt_random_item<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    failure_count: u32,
    rng: &mut R,
) -> Result<Option<Entity>, DeteriorationError> {
    let items: Vec<Entity> = world.query::<&ItemDef>().iter().map(|(e, _)| e).collect();
    let Some(&item) = items.choose(rng) else {
        return Ok(None);
    };
    corrupt_item(
        world,
        store,
        item,
        item_name_ratio(failure_count),
        tooltip_ratio(failure_count),
        rng,
    )?;
    Ok(Some(item))
}

/// Give each item the subject is holding an `8%·f` chance of heavier corruption.
/// Returns the items hit.
pub fn corrupt_held_items<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    subject: Entity,
    failure_count: u32,
    rng: &mut R,
) -> Result<Vec<Entity>, DeteriorationError> {
    let held: Vec<Entity> = world.get::<&Inventory>(subject)?.slots.iter().flatten().copied().collect();
    let chance = held_item_chance(failure_count);
    let mut hit = Vec::new();
    for item in held {
        if !world.contains(item) {
            continue;
        }
        let result = corrupt_held_item(world, store, item, failure_count, chance, rng);
        match result {
            Ok(true) => hit.push(item),
            Ok(false) => {}
            Err(e) => report("corrupt held item", Err(e)),
        }
    }
    Ok(hit)
}

fn corrupt_held_item<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    item: Entity,
    failure_count: u32,
    chance: f64,
    rng: &mut R,
) -> Result<bool, DeteriorationError> {
    store.capture_text(world, TextSlot::ItemName, item)?;
    store.capture_tooltips(world, item)?;
    if !rng.gen_bool(chance) {
        return Ok(false);
    }
    corrupt_item(
        world,
        store,
        item,
        held_name_ratio(failure_count),
        held_tooltip_ratio(failure_count),
        rng,
    )?;
    Ok(true)
}

/// Hand every item with tooltips another item's tooltip set, and with a 50%
/// chance that item's name too. Originals are captured first so a reset undoes it.
///
/// The permutation is a single cycle, so no item keeps its own set. Returns the
/// number of items shuffled (0 when fewer than two qualify).
pub fn shuffle_all_tooltips<R: Rng + ?Sized>(
    world: &World,
    store: &mut CorruptionStore,
    rng: &mut R,
) -> Result<usize, DeteriorationError> {
    let mut items: Vec<(Entity, String, Vec<String>)> = world
        .query::<&ItemDef>()
        .iter()
        .filter(|(_, def)| !def.tooltips.is_empty())
        .map(|(e, def)| (e, def.name.clone(), def.tooltips.clone()))
        .collect();
    if items.len() < 2 {
        return Ok(0);
    }
    items.sort_by_key(|(e, _, _)| e.id());

    // Empty names have no original to restore, so they never take part in the swap.
    let mut renamable = Vec::with_capacity(items.len());
    for (item, _, _) in &items {
        store.capture_tooltips(world, *item)?;
        renamable.push(store.capture_text(world, TextSlot::ItemName, *item)?.is_some());
    }

    // Sattolo's algorithm: a uniformly random cyclic permutation.
    let mut source: Vec<usize> = (0..items.len()).collect();
    for i in (1..source.len()).rev() {
        let j = rng.gen_range(0..i);
        source.swap(i, j);
    }

    for (i, &from) in source.iter().enumerate() {
        let (_, name, tooltips) = &items[from];
        let mut def = world.get::<&mut ItemDef>(items[i].0)?;
        def.tooltips = tooltips.clone();
        if renamable[i] && rng.gen_bool(0.5) {
            def.name = name.clone();
        }
    }
    Ok(items.len())
}
