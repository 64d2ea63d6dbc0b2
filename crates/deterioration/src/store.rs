//! Original-text store for every piece of content the engine corrupts.
//!
//! A handle's original is captured on first touch and every later corruption
//! is derived from that original, never from the already-corrupted text.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;

use crate::codec::corrupt_string;
use crate::error::DeteriorationError;
use crate::host::{ItemDef, TextElement, WorldLabel};

/// Which single-string field of an entity a corruption targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSlot {
    /// [`WorldLabel::header`]
    Label,
    /// [`TextElement::text`]
    Signage,
    /// [`ItemDef::name`]
    ItemName,
}

impl TextSlot {
    pub const ALL: [TextSlot; 3] = [TextSlot::Label, TextSlot::Signage, TextSlot::ItemName];

    pub fn read(self, world: &World, entity: Entity) -> Result<String, DeteriorationError> {
        Ok(match self {
            TextSlot::Label => world.get::<&WorldLabel>(entity)?.header.clone(),
            TextSlot::Signage => world.get::<&TextElement>(entity)?.text.clone(),
            TextSlot::ItemName => world.get::<&ItemDef>(entity)?.name.clone(),
        })
    }

    pub fn write(self, world: &World, entity: Entity, text: String) -> Result<(), DeteriorationError> {
        match self {
            TextSlot::Label => world.get::<&mut WorldLabel>(entity)?.header = text,
            TextSlot::Signage => world.get::<&mut TextElement>(entity)?.text = text,
            TextSlot::ItemName => world.get::<&mut ItemDef>(entity)?.name = text,
        }
        Ok(())
    }
}

/// Handle -> original value map. Captures are first-writer-wins.
#[derive(Debug, Clone)]
pub struct OriginalStore<T> {
    originals: HashMap<Entity, T>,
}

impl<T> Default for OriginalStore<T> {
    fn default() -> Self {
        Self { originals: HashMap::new() }
    }
}

impl<T> OriginalStore<T> {
    /// Capture `current()` as the original unless one is already stored.
    ///
    /// Check-and-insert is a single entry operation, so a handle can never end
    /// up with a second, already-corrupted "original". `current` returning
    /// `None` means there is nothing worth capturing.
    pub fn capture_with<F>(&mut self, handle: Entity, current: F) -> Result<Option<&T>, DeteriorationError>
    where
        F: FnOnce() -> Result<Option<T>, DeteriorationError>,
    {
        match self.originals.entry(handle) {
            Entry::Occupied(slot) => Ok(Some(&*slot.into_mut())),
            Entry::Vacant(slot) => Ok(current()?.map(|value| &*slot.insert(value))),
        }
    }

    pub fn original(&self, handle: Entity) -> Option<&T> {
        self.originals.get(&handle)
    }

    pub fn contains(&self, handle: Entity) -> bool {
        self.originals.contains_key(&handle)
    }

    pub fn take(&mut self, handle: Entity) -> Option<T> {
        self.originals.remove(&handle)
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (Entity, T)> + '_ {
        self.originals.drain()
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }
}

/// Originals for every corrupted label, sign, item name and tooltip set.
#[derive(Debug, Clone, Default)]
pub struct CorruptionStore {
    texts: HashMap<TextSlot, OriginalStore<String>>,
    tooltips: OriginalStore<Vec<String>>,
}

impl CorruptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: TextSlot) -> &mut OriginalStore<String> {
        self.texts.entry(slot).or_default()
    }

    pub fn original_text(&self, slot: TextSlot, handle: Entity) -> Option<&str> {
        self.texts.get(&slot)?.original(handle).map(String::as_str)
    }

    pub fn original_tooltips(&self, handle: Entity) -> Option<&[String]> {
        self.tooltips.original(handle).map(Vec::as_slice)
    }

    /// Number of captured handles across all slots.
    pub fn len(&self) -> usize {
        self.texts.values().map(OriginalStore::len).sum::<usize>() + self.tooltips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capture a text field's original if it has none yet. Empty text is not captured.
    pub fn capture_text(
        &mut self,
        world: &World,
        slot: TextSlot,
        handle: Entity,
    ) -> Result<Option<String>, DeteriorationError> {
        let captured = self.slot_mut(slot).capture_with(handle, || {
            let text = slot.read(world, handle)?;
            Ok((!text.is_empty()).then_some(text))
        })?;
        Ok(captured.cloned())
    }

    /// Capture an item's tooltip set if it has none yet. Empty sets are not captured.
    pub fn capture_tooltips(
        &mut self,
        world: &World,
        handle: Entity,
    ) -> Result<Option<Vec<String>>, DeteriorationError> {
        let captured = self.tooltips.capture_with(handle, || {
            let tooltips = world.get::<&ItemDef>(handle)?.tooltips.clone();
            Ok((!tooltips.is_empty()).then_some(tooltips))
        })?;
        Ok(captured.cloned())
    }

    /// Overwrite a text field with a corrupted copy of its original.
    /// Returns false when there was nothing to corrupt.
    pub fn corrupt_text<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        slot: TextSlot,
        handle: Entity,
        ratio: f32,
        rng: &mut R,
    ) -> Result<bool, DeteriorationError> {
        let Some(original) = self.capture_text(world, slot, handle)? else {
            return Ok(false);
        };
        slot.write(world, handle, corrupt_string(&original, ratio, rng))?;
        Ok(true)
    }

    /// Corrupt every non-empty tooltip line of an item from its original line.
    /// Lines beyond the captured original are left alone.
    pub fn corrupt_tooltips<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        handle: Entity,
        ratio: f32,
        rng: &mut R,
    ) -> Result<bool, DeteriorationError> {
        let Some(original) = self.capture_tooltips(world, handle)? else {
            return Ok(false);
        };
        let mut item = world.get::<&mut ItemDef>(handle)?;
        for (line, source) in item.tooltips.iter_mut().zip(original.iter()) {
            if !line.is_empty() {
                *line = corrupt_string(source, ratio, rng);
            }
        }
        Ok(true)
    }

    /// Write one captured original back and forget it. No capture, no-op.
    pub fn restore_text(&mut self, world: &World, slot: TextSlot, handle: Entity) -> Result<bool, DeteriorationError> {
        match self.slot_mut(slot).take(handle) {
            Some(original) => {
                slot.write(world, handle, original)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn restore_tooltips(&mut self, world: &World, handle: Entity) -> Result<bool, DeteriorationError> {
        match self.tooltips.take(handle) {
            Some(original) => {
                world.get::<&mut ItemDef>(handle)?.tooltips = original;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write every original back verbatim and empty the store.
    ///
    /// Handles whose entity has been despawned are dropped quietly. Returns the
    /// number of fields restored. Calling it on an empty store does nothing.
    pub fn restore_all(&mut self, world: &World) -> usize {
        let mut restored = 0;
        for slot in TextSlot::ALL {
            for (handle, original) in self.slot_mut(slot).drain() {
                match slot.write(world, handle, original) {
                    Ok(()) => restored += 1,
                    Err(e) => log::debug!("Could not restore {:?} on {:?}: {}", slot, handle, e),
                }
            }
        }
        for (handle, original) in self.tooltips.drain() {
            match world.get::<&mut ItemDef>(handle) {
                Ok(mut item) => {
                    item.tooltips = original;
                    restored += 1;
                }
                Err(e) => log::debug!("Could not restore tooltips on {:?}: {}", handle, e),
            }
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn restore_after_many_corruptions_returns_first_original() {
        let mut world = World::new();
        let label = world.spawn((WorldLabel { header: "Main Entrance".into() },));
        let mut store = CorruptionStore::new();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..20 {
            store.corrupt_text(&world, TextSlot::Label, label, 0.6, &mut rng).unwrap();
        }
        assert_eq!(store.original_text(TextSlot::Label, label), Some("Main Entrance"));
        assert!(store.restore_text(&world, TextSlot::Label, label).unwrap());
        assert_eq!(world.get::<&WorldLabel>(label).unwrap().header, "Main Entrance");
    }

    #[test]
    fn restoring_one_item_leaves_the_others_corrupted() {
        let mut world = World::new();
        let key = world.spawn((ItemDef::new("Key", &["Use : [E]", "Drop : [G]"]),));
        let shovel = world.spawn((ItemDef::new("Shovel", &["Swing : [RMB]"]),));
        let mut store = CorruptionStore::new();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..5 {
            store.corrupt_tooltips(&world, key, 1.0, &mut rng).unwrap();
            store.corrupt_tooltips(&world, shovel, 1.0, &mut rng).unwrap();
        }

        assert!(store.restore_tooltips(&world, key).unwrap());
        assert_eq!(world.get::<&ItemDef>(key).unwrap().tooltips, vec!["Use : [E]", "Drop : [G]"]);
        assert!(!store.restore_tooltips(&world, key).unwrap());
        assert_ne!(world.get::<&ItemDef>(shovel).unwrap().tooltips, vec!["Swing : [RMB]"]);
        assert!(store.original_tooltips(shovel).is_some());
    }

    #[test]
    fn restore_without_capture_is_noop() {
        let mut world = World::new();
        let label = world.spawn((WorldLabel { header: "Ship".into() },));
        let mut store = CorruptionStore::new();
        assert!(!store.restore_text(&world, TextSlot::Label, label).unwrap());
        assert_eq!(world.get::<&WorldLabel>(label).unwrap().header, "Ship");
    }

    #[test]
    fn capture_is_first_writer_wins() {
        let mut world = World::new();
        let sign = world.spawn((TextElement { name: "ad_board".into(), text: "Buy more scrap".into() },));
        let mut store = CorruptionStore::new();
        store.capture_text(&world, TextSlot::Signage, sign).unwrap();
        world.get::<&mut TextElement>(sign).unwrap().text = "changed".into();
        let captured = store.capture_text(&world, TextSlot::Signage, sign).unwrap();
        assert_eq!(captured.as_deref(), Some("Buy more scrap"));
    }

    #[test]
    fn empty_text_is_not_captured() {
        let mut world = World::new();
        let label = world.spawn((WorldLabel { header: String::new() },));
        let mut store = CorruptionStore::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!store.corrupt_text(&world, TextSlot::Label, label, 0.5, &mut rng).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn tooltip_corruption_skips_empty_lines_and_extra_lines() {
        let mut world = World::new();
        let item = world.spawn((ItemDef::new("Key", &["Use : [LMB]", ""]),));
        let mut store = CorruptionStore::new();
        let mut rng = StdRng::seed_from_u64(9);
        store.capture_tooltips(&world, item).unwrap();
        world.get::<&mut ItemDef>(item).unwrap().tooltips.push("Extra".into());

        store.corrupt_tooltips(&world, item, 1.0, &mut rng).unwrap();
        let tips = world.get::<&ItemDef>(item).unwrap().tooltips.clone();
        assert_ne!(tips[0], "Use : [LMB]");
        assert_eq!(tips[1], "");
        assert_eq!(tips[2], "Extra");
    }

    #[test]
    fn restore_all_drains_and_second_call_is_noop() {
        let mut world = World::new();
        let label = world.spawn((WorldLabel { header: "Facility".into() },));
        let item = world.spawn((ItemDef::new("Shovel", &["Swing : [LMB]"]),));
        let gone = world.spawn((WorldLabel { header: "Temporary".into() },));
        let mut store = CorruptionStore::new();
        let mut rng = StdRng::seed_from_u64(2);

        store.corrupt_text(&world, TextSlot::Label, label, 0.5, &mut rng).unwrap();
        store.corrupt_text(&world, TextSlot::Label, gone, 0.5, &mut rng).unwrap();
        store.corrupt_text(&world, TextSlot::ItemName, item, 0.5, &mut rng).unwrap();
        store.corrupt_tooltips(&world, item, 0.5, &mut rng).unwrap();
        world.despawn(gone).unwrap();

        assert_eq!(store.restore_all(&world), 3);
        assert!(store.is_empty());
        assert_eq!(world.get::<&WorldLabel>(label).unwrap().header, "Facility");
        let def = world.get::<&ItemDef>(item).unwrap();
        assert_eq!(def.name, "Shovel");
        assert_eq!(def.tooltips, vec!["Swing : [LMB]".to_string()]);
        drop(def);
        assert_eq!(store.restore_all(&world), 0);
    }
}
