//! Room generation: sizes, positions and portals for every room in a run.

mod placement;
mod sizing;

use std::collections::VecDeque;
use std::iter;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::config::{DungeonConfig, LayoutConfig, LimitsConfig, RoomConfig};
use crate::error::GenerationResult;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::prefab::{Placement, PlacementMode, Prefab};
use crate::random::DungeonRng;
use crate::types::{CellKind, Pos, Rect, RoomId};

use placement::{PlacementRequest, find_center};
use sizing::sample_room_size;

#[derive(Clone, Debug, PartialEq)]
pub enum RoomOrigin {
    Procedural,
    Prefab { name: String, mode: PlacementMode },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub id: RoomId,
    /// Creation order within the run.
    pub index: usize,
    pub origin: RoomOrigin,
    pub rect: Rect,
    pub center: Pos,
    /// Collision circle used during placement.
    pub radius: f64,
    /// Footprint cells, row-major over `rect`.
    pub cells: Vec<CellKind>,
    pub portals: Vec<Pos>,
}

impl Room {
    pub fn name(&self) -> Option<&str> {
        match &self.origin {
            RoomOrigin::Procedural => None,
            RoomOrigin::Prefab { name, .. } => Some(name),
        }
    }

    /// Human-readable label for logs and errors.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => format!("{name} #{}", self.index),
            None => format!("room #{}", self.index),
        }
    }

    pub fn is_prefab(&self) -> bool {
        matches!(self.origin, RoomOrigin::Prefab { .. })
    }

    pub fn width(&self) -> i32 {
        self.rect.width
    }

    pub fn height(&self) -> i32 {
        self.rect.height
    }

    pub fn area(&self) -> i64 {
        self.rect.area()
    }

    /// Global positions of the room's floor cells.
    pub fn floor_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.rect
            .cells()
            .zip(&self.cells)
            .filter(|(_, kind)| kind.is_occupied())
            .map(|(pos, _)| pos)
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.rect = self.rect.translated(dx, dy);
        self.center = self.center.offset(dx, dy);
        for portal in &mut self.portals {
            *portal = portal.offset(dx, dy);
        }
    }
}

/// Arena of rooms plus their creation order.
#[derive(Clone, Debug, Default)]
pub struct RoomSet {
    rooms: SlotMap<RoomId, Room>,
    order: Vec<RoomId>,
}

impl RoomSet {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn by_index(&self, index: usize) -> Option<&Room> {
        self.order.get(index).and_then(|&id| self.rooms.get(id))
    }

    pub fn ids(&self) -> &[RoomId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> + '_ {
        self.order.iter().filter_map(|&id| self.rooms.get(id))
    }

    /// First room carrying `name`, in creation order.
    pub fn find_by_name(&self, name: &str) -> Option<&Room> {
        self.iter().find(|room| room.name() == Some(name))
    }

    pub fn prefab_count(&self) -> usize {
        self.iter().filter(|room| room.is_prefab()).count()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.order.clear();
    }

    fn insert(&mut self, draft: RoomDraft) -> RoomId {
        let index = self.order.len();
        let id = self.rooms.insert_with_key(|id| Room {
            id,
            index,
            origin: draft.origin,
            rect: draft.rect,
            center: draft.center,
            radius: draft.radius,
            cells: draft.cells,
            portals: draft.portals,
        });
        self.order.push(id);
        id
    }

    fn translate_all(&mut self, dx: i32, dy: i32) {
        for room in self.rooms.values_mut() {
            room.translate(dx, dy);
        }
    }
}

struct RoomDraft {
    origin: RoomOrigin,
    rect: Rect,
    center: Pos,
    radius: f64,
    cells: Vec<CellKind>,
    portals: Vec<Pos>,
}

/// Footprint anchored on an integer centre; the centre sits in the lower
/// half for even sizes.
fn rect_around(center: Pos, width: i32, height: i32) -> Rect {
    Rect::new(center.x - width / 2, center.y - height / 2, width, height)
}

fn collision_radius(width: i32, height: i32) -> f64 {
    (f64::from(width) / 2.0).hypot(f64::from(height) / 2.0)
}

/// Running min/max of every placed footprint, used to normalise the layout.
#[derive(Clone, Copy, Debug)]
struct Extents {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Default for Extents {
    fn default() -> Self {
        Self { left: i32::MAX, top: i32::MAX, right: i32::MIN, bottom: i32::MIN }
    }
}

impl Extents {
    fn include(&mut self, rect: Rect) {
        self.left = self.left.min(rect.x);
        self.top = self.top.min(rect.y);
        self.right = self.right.max(rect.right());
        self.bottom = self.bottom.max(rect.bottom());
    }

    fn is_empty(&self) -> bool {
        self.left > self.right
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoomStage {
    rooms: RoomConfig,
    layout: LayoutConfig,
    limits: LimitsConfig,
    prefabs: Vec<Prefab>,
    pending: VecDeque<Prefab>,
    extents: Extents,
}

impl RoomStage {
    /// Prefab copies count toward `rooms.amount`; nothing is placed past it.
    fn has_work(&self, placed: usize) -> bool {
        placed < self.rooms.amount as usize
    }

    fn place_prefab(
        &mut self,
        ctx: &mut GenerationContext,
        prefab: &Prefab,
    ) -> GenerationResult<()> {
        let layout = &prefab.layout;
        let radius =
            prefab.room_radius.unwrap_or_else(|| collision_radius(layout.width, layout.height));
        let label = format!("{} #{}", prefab.name, ctx.rooms.len());

        let request = match &prefab.placement {
            Placement::Scatter => PlacementRequest::Scatter,
            Placement::Fixed(center) => PlacementRequest::Fixed(*center),
            Placement::Radius { center, radius } => {
                PlacementRequest::Orbit { center: *center, radius: *radius }
            }
            Placement::Relative { room, radius: orbit } => match ctx.rooms.find_by_name(room) {
                Some(anchor) => PlacementRequest::Orbit {
                    center: anchor.center,
                    radius: orbit.unwrap_or(anchor.radius + radius),
                },
                None => {
                    warn!(
                        prefab = %prefab.name,
                        related_room = %room,
                        "related room not placed yet, falling back to scatter placement"
                    );
                    PlacementRequest::Scatter
                }
            },
        };

        let center = find_center(
            &mut ctx.rng,
            &ctx.rooms,
            radius,
            &request,
            &self.placement_settings(),
            &label,
        )?;
        let rect = rect_around(center, layout.width, layout.height);
        let portals = layout.portals.iter().map(|portal| portal.offset(rect.x, rect.y)).collect();

        self.extents.include(rect);
        ctx.rooms.insert(RoomDraft {
            origin: RoomOrigin::Prefab { name: prefab.name.clone(), mode: prefab.placement.mode() },
            rect,
            center,
            radius,
            cells: layout.cells.clone(),
            portals,
        });
        Ok(())
    }

    fn place_procedural(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        let (width, height) = sample_room_size(&mut ctx.rng, &self.rooms, &self.limits)?;
        let radius = collision_radius(width, height);
        let label = format!("room #{}", ctx.rooms.len());

        let center = find_center(
            &mut ctx.rng,
            &ctx.rooms,
            radius,
            &PlacementRequest::Scatter,
            &self.placement_settings(),
            &label,
        )?;
        let rect = rect_around(center, width, height);
        let portals = side_portals(&mut ctx.rng, rect);

        self.extents.include(rect);
        ctx.rooms.insert(RoomDraft {
            origin: RoomOrigin::Procedural,
            rect,
            center,
            radius,
            cells: vec![CellKind::Room; rect.area() as usize],
            portals,
        });
        Ok(())
    }

    fn placement_settings(&self) -> placement::PlacementSettings {
        placement::PlacementSettings {
            start: Pos::new(self.rooms.start_x, self.rooms.start_y),
            spacing_x: self.layout.spacing_x,
            spacing_y: self.layout.spacing_y,
            max_attempts: self.limits.max_placement_attempts,
        }
    }
}

/// One portal per side: left and top sit on the room's first column/row,
/// right and bottom on the cell just past the footprint.
fn side_portals(rng: &mut DungeonRng, rect: Rect) -> Vec<Pos> {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    vec![
        Pos::new(x1, rng.range_or_high(y1 + 1, y2 - 2)),
        Pos::new(x2, rng.range_or_high(y1 + 1, y2 - 2)),
        Pos::new(rng.range_or_high(x1 + 1, x2 - 2), y1),
        Pos::new(rng.range_or_high(x1 + 1, x2 - 2), y2),
    ]
}

impl PipelineStage for RoomStage {
    fn kind(&self) -> StageKind {
        StageKind::Rooms
    }

    fn clear(&mut self) {
        self.prefabs.clear();
        self.pending.clear();
        self.extents = Extents::default();
    }

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()> {
        self.rooms = config.rooms.clone();
        self.layout = config.layout.clone();
        self.limits = config.limits.clone();
        self.prefabs = config.load_prefabs()?;
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.rooms.clear();
        self.extents = Extents::default();
        self.pending = self
            .prefabs
            .iter()
            .filter(|prefab| prefab.required)
            .flat_map(|prefab| iter::repeat_n(prefab.clone(), prefab.copies() as usize))
            .collect();
        debug!(
            target_rooms = self.rooms.amount,
            required_prefabs = self.pending.len(),
            "room generation starting"
        );
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        if self.has_work(ctx.rooms.len()) {
            match self.pending.pop_front() {
                Some(prefab) => self.place_prefab(ctx, &prefab)?,
                None => self.place_procedural(ctx)?,
            }
        }

        if self.has_work(ctx.rooms.len()) {
            return Ok(StepStatus::Continue);
        }
        if !self.pending.is_empty() {
            warn!(
                target_rooms = self.rooms.amount,
                skipped = self.pending.len(),
                "room target reached before every required prefab copy was placed"
            );
            self.pending.clear();
        }
        Ok(StepStatus::Done)
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        if self.extents.is_empty() {
            return Ok(());
        }
        let Extents { left, top, right, bottom } = self.extents;
        ctx.rooms.translate_all(-left, -top);
        ctx.bounds.include(right - left, bottom - top);
        debug!(
            rooms = ctx.rooms.len(),
            width = ctx.bounds.width,
            height = ctx.bounds.height,
            "rooms normalised to origin"
        );
        Ok(())
    }

    fn cursor(&self, ctx: &GenerationContext) -> StageCursor {
        StageCursor::Rooms { placed: ctx.rooms.len(), pending_prefabs: self.pending.len() }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{CellKind, Pos, Rect};
    use super::{Room, RoomDraft, RoomOrigin, RoomSet};

    /// 1x1 rooms at the given centres, each with a single portal on itself.
    pub(crate) fn room_set_at(centers: &[(i32, i32)]) -> RoomSet {
        let mut rooms = RoomSet::default();
        for &(x, y) in centers {
            rooms.insert(RoomDraft {
                origin: RoomOrigin::Procedural,
                rect: Rect::new(x, y, 1, 1),
                center: Pos::new(x, y),
                radius: 0.5,
                cells: vec![CellKind::Room],
                portals: vec![Pos::new(x, y)],
            });
        }
        rooms
    }

    pub(crate) fn rooms_at(centers: &[(i32, i32)]) -> Vec<Room> {
        room_set_at(centers).iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::prefab::PrefabConfig;
    use super::*;

    fn generate(config: &DungeonConfig) -> GenerationContext {
        let mut stage = RoomStage::default();
        stage.load_data(config).expect("config loads");
        let mut ctx = GenerationContext::new(config.general.seed);
        stage.run(&mut ctx).expect("rooms generate");
        ctx
    }

    #[test]
    fn procedural_rooms_have_four_portals_on_their_sides() {
        let config = DungeonConfig::default().with_seed(17);
        let ctx = generate(&config);
        assert_eq!(ctx.rooms.len(), 20);
        for room in ctx.rooms.iter() {
            let rect = room.rect;
            assert_eq!(room.portals.len(), 4);
            assert_eq!(room.portals[0].x, rect.x);
            assert_eq!(room.portals[1].x, rect.right());
            assert_eq!(room.portals[2].y, rect.y);
            assert_eq!(room.portals[3].y, rect.bottom());
        }
    }

    #[test]
    fn layout_is_normalised_to_the_origin() {
        let ctx = generate(&DungeonConfig::default().with_seed(5));
        let left = ctx.rooms.iter().map(|room| room.rect.x).min();
        let top = ctx.rooms.iter().map(|room| room.rect.y).min();
        assert_eq!((left, top), (Some(0), Some(0)));
        for room in ctx.rooms.iter() {
            assert!(room.rect.right() <= ctx.bounds.width);
            assert!(room.rect.bottom() <= ctx.bounds.height);
        }
    }

    #[test]
    fn required_prefabs_come_first_in_declaration_order() {
        let mut config = DungeonConfig::default().with_seed(8);
        config.rooms.amount = 4;
        for name in ["entry", "vault"] {
            config.prefabs.push(PrefabConfig {
                name: name.to_string(),
                layout: "FFF\nFPF\nFFF".to_string(),
                required: true,
                count: 2,
                ..PrefabConfig::default()
            });
        }
        config.prefabs.push(PrefabConfig {
            name: "optional".to_string(),
            layout: "FF".to_string(),
            ..PrefabConfig::default()
        });

        let ctx = generate(&config);
        let names: Vec<Option<&str>> = ctx.rooms.iter().map(Room::name).collect();
        assert_eq!(
            names,
            vec![Some("entry"), Some("entry"), Some("vault"), Some("vault")],
            "four required copies already meet the room target"
        );
        let entry = ctx.rooms.by_index(0).expect("entry room");
        assert_eq!(entry.portals, vec![entry.rect.cells().nth(4).expect("middle cell")]);
        assert_eq!(entry.floor_cells().count(), 8);
    }

    #[test]
    fn relative_prefab_without_anchor_falls_back_to_scatter() {
        let mut config = DungeonConfig::default().with_seed(3);
        config.rooms.amount = 2;
        config.prefabs.push(PrefabConfig {
            name: "shrine".to_string(),
            layout: "FF\nFF".to_string(),
            required: true,
            mode: PlacementMode::Relative,
            related_room: Some("missing".to_string()),
            ..PrefabConfig::default()
        });

        let ctx = generate(&config);
        assert_eq!(ctx.rooms.len(), 2);
        assert_eq!(ctx.rooms.by_index(0).and_then(Room::name), Some("shrine"));
    }

    #[test]
    fn room_target_caps_required_prefab_copies() {
        let mut config = DungeonConfig::default().with_seed(12);
        config.rooms.amount = 2;
        config.prefabs.push(PrefabConfig {
            name: "cell".to_string(),
            layout: "FF\nFF".to_string(),
            required: true,
            count: 5,
            ..PrefabConfig::default()
        });

        let mut stage = RoomStage::default();
        stage.load_data(&config).expect("config loads");
        let mut ctx = GenerationContext::new(12);
        stage.run(&mut ctx).expect("rooms generate");

        assert_eq!(ctx.rooms.len(), 2);
        assert!(ctx.rooms.iter().all(|room| room.name() == Some("cell")));
        assert_eq!(stage.cursor(&ctx), StageCursor::Rooms { placed: 2, pending_prefabs: 0 });
    }

    #[test]
    fn zero_room_target_places_nothing() {
        let mut config = DungeonConfig::default().with_seed(6);
        config.rooms.amount = 0;
        config.prefabs.push(PrefabConfig {
            name: "cell".to_string(),
            layout: "FF\nFF".to_string(),
            required: true,
            ..PrefabConfig::default()
        });
        assert_eq!(generate(&config).rooms.len(), 0);
    }

    #[test]
    fn cursor_tracks_pending_prefabs() {
        let mut config = DungeonConfig::default().with_seed(4);
        config.prefabs.push(PrefabConfig {
            name: "hall".to_string(),
            layout: "FFFF".to_string(),
            required: true,
            count: 3,
            ..PrefabConfig::default()
        });
        let mut stage = RoomStage::default();
        stage.load_data(&config).expect("config loads");
        let mut ctx = GenerationContext::new(4);
        stage.pre_step(&mut ctx).expect("pre step");
        assert_eq!(stage.cursor(&ctx), StageCursor::Rooms { placed: 0, pending_prefabs: 3 });
        stage.step(&mut ctx).expect("first step");
        assert_eq!(stage.cursor(&ctx), StageCursor::Rooms { placed: 1, pending_prefabs: 2 });
    }
}
