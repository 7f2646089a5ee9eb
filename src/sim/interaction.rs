//! Precomputed per-cell interaction lookup
//!
//! Static entities are hashed once when a level starts so the engine and the
//! planners can ask "what is at (x, y)" in O(1). Cells map to a list of group
//! ids; each group carries an interaction kind that can change at runtime
//! (food gets eaten, charge groups toggle).

use ahash::AHashMap;
use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, Footprint, InteractKind};
use super::grouping::connected_conductive_groups;

/// What a cell does to the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interaction {
    /// Inert; charge groups hold this while uncharged
    Nothing,
    Wall,
    Hazard,
    Charge,
    Finish,
    Food,
}

impl Interaction {
    const ALL: [Interaction; 6] = [
        Interaction::Nothing,
        Interaction::Wall,
        Interaction::Hazard,
        Interaction::Charge,
        Interaction::Finish,
        Interaction::Food,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// How a group reacts to electricity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionType {
    /// Never changes
    Static,
    /// Wall while charged
    Wall,
    /// Hazard while charged
    Hazard,
    /// Charge while charged
    Charge,
}

/// Set of interactions present on a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionSet(u8);

impl InteractionSet {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, interaction: Interaction) -> bool {
        self.0 & interaction.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Walls block movement unless food sits on the same cell
    pub fn is_passable(self) -> bool {
        !self.contains(Interaction::Wall) || self.contains(Interaction::Food)
    }

    pub fn iter(self) -> impl Iterator<Item = Interaction> {
        Interaction::ALL
            .into_iter()
            .filter(move |interaction| self.contains(*interaction))
    }

    fn insert(&mut self, interaction: Interaction) {
        if interaction != Interaction::Nothing {
            self.0 |= interaction.bit();
        }
    }
}

impl FromIterator<Interaction> for InteractionSet {
    fn from_iter<T: IntoIterator<Item = Interaction>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for interaction in iter {
            set.insert(interaction);
        }
        set
    }
}

/// Identifier of an interaction group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl GroupId {
    pub const WALL: Self = Self(1);
    pub const HAZARD: Self = Self(2);
    pub const CHARGE: Self = Self(3);
    pub const FINISH: Self = Self(4);
    pub const FOOD: Self = Self(5);

    /// First id handed out for groups created while building a level
    const FIRST_DYNAMIC: u32 = 10;
}

/// Entities sharing one interaction kind (and one charge state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionGroup {
    pub interaction: Interaction,
    pub kind: InteractionType,
    /// Members, updated together when the group's charge changes
    pub entities: Vec<EntityId>,
}

impl InteractionGroup {
    fn new(interaction: Interaction, kind: InteractionType) -> Self {
        Self {
            interaction,
            kind,
            entities: Vec::new(),
        }
    }
}

/// Hashed cell -> interaction lookup for one level
#[derive(Debug, Clone)]
pub struct InteractionIndex {
    groups: AHashMap<GroupId, InteractionGroup>,
    positions: AHashMap<IVec2, Vec<GroupId>>,
    next_group_id: u32,
}

impl InteractionIndex {
    /// Hash every static entity of a level
    pub fn build(entities: &[Entity]) -> Self {
        let mut index = Self {
            groups: AHashMap::new(),
            positions: AHashMap::new(),
            next_group_id: GroupId::FIRST_DYNAMIC,
        };
        for (id, interaction) in [
            (GroupId::WALL, Interaction::Wall),
            (GroupId::HAZARD, Interaction::Hazard),
            (GroupId::CHARGE, Interaction::Charge),
            (GroupId::FINISH, Interaction::Finish),
            (GroupId::FOOD, Interaction::Food),
        ] {
            index
                .groups
                .insert(id, InteractionGroup::new(interaction, InteractionType::Static));
        }

        let mut collision = Vec::new();
        let mut hazard = Vec::new();
        let mut charge = Vec::new();
        let mut finish = Vec::new();

        for (id, entity) in entities.iter().enumerate() {
            collision.extend(entity.collision_coords());
            hazard.extend(entity.hurt_coords());
            if entity.charged() {
                charge.extend(entity.electricity_coords());
            }

            match entity.interact_kind() {
                InteractKind::Food => {
                    if let Some(food) = entity.as_food().filter(|food| !food.eaten) {
                        index.register_food(food.pos, id);
                    }
                }
                InteractKind::Finish => finish.extend(entity.interact_coords()),
                InteractKind::None => {}
            }
        }

        index.register_static(GroupId::WALL, collision);
        index.register_static(GroupId::HAZARD, hazard);
        index.register_static(GroupId::CHARGE, charge);
        index.register_static(GroupId::FINISH, finish);

        for members in connected_conductive_groups(entities) {
            let charged = members.iter().any(|&id| entities[id].charged());
            let interaction = if charged {
                Interaction::Charge
            } else {
                Interaction::Nothing
            };

            let mut cells: Vec<IVec2> = members
                .iter()
                .flat_map(|&id| entities[id].electricity_coords())
                .collect();
            sort_cells(&mut cells);
            cells.dedup();

            let group_id = index.allocate_group(InteractionGroup {
                interaction,
                kind: InteractionType::Charge,
                entities: members,
            });
            for cell in cells {
                index.positions.entry(cell).or_default().push(group_id);
            }
        }

        log::debug!(
            "Interaction index built: {} groups over {} cells",
            index.groups.len(),
            index.positions.len()
        );
        index
    }

    /// Interactions present on a cell (empty for anything unregistered)
    pub fn get_interactions(&self, pos: IVec2) -> InteractionSet {
        self.positions
            .get(&pos)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.groups.get(id))
                    .map(|group| group.interaction)
                    .collect()
            })
            .unwrap_or(InteractionSet::EMPTY)
    }

    /// Remove the food registered on a cell.
    ///
    /// Returns the eaten food's entity id, or `None` when there is no food
    /// there (already eaten or never placed).
    pub fn update_eaten_food(&mut self, pos: IVec2) -> Option<EntityId> {
        let ids = self.positions.get_mut(&pos)?;
        let slot = ids.iter().position(|id| {
            self.groups
                .get(id)
                .is_some_and(|group| group.interaction == Interaction::Food)
        })?;
        let group_id = ids.remove(slot);
        if ids.is_empty() {
            self.positions.remove(&pos);
        }

        let group = self.groups.remove(&group_id)?;
        group.entities.first().copied()
    }

    /// Put eaten food back on a cell (undo)
    pub fn restore_food(&mut self, pos: IVec2, entity: EntityId) {
        let already_there = self.positions.get(&pos).is_some_and(|ids| {
            ids.iter().any(|id| {
                self.groups
                    .get(id)
                    .is_some_and(|group| group.interaction == Interaction::Food)
            })
        });
        if !already_there {
            self.register_food(pos, entity);
        }
    }

    /// Switch the charge of every conductive group touching a cell and
    /// propagate it to the group's entities.
    pub fn update_charge(&mut self, pos: IVec2, charged: bool, entities: &mut [Entity]) {
        let Some(ids) = self.positions.get(&pos) else {
            return;
        };
        for id in ids {
            let Some(group) = self.groups.get_mut(id) else {
                continue;
            };
            if group.kind != InteractionType::Charge {
                continue;
            }

            group.interaction = if charged {
                Interaction::Charge
            } else {
                Interaction::Nothing
            };
            for &member in &group.entities {
                if let Some(entity) = entities.get_mut(member) {
                    entity.set_charge(charged);
                }
            }
        }
    }

    /// The conductive group registered on a cell, if any
    pub fn charge_group_at(&self, pos: IVec2) -> Option<&InteractionGroup> {
        self.positions.get(&pos)?.iter().find_map(|id| {
            self.groups
                .get(id)
                .filter(|group| group.kind == InteractionType::Charge)
        })
    }

    fn allocate_group(&mut self, group: InteractionGroup) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        self.groups.insert(id, group);
        id
    }

    fn register_food(&mut self, pos: IVec2, entity: EntityId) {
        let mut group = InteractionGroup::new(Interaction::Food, InteractionType::Static);
        group.entities.push(entity);
        let id = self.allocate_group(group);
        self.positions.entry(pos).or_default().push(id);
    }

    fn register_static(&mut self, id: GroupId, mut cells: Vec<IVec2>) {
        sort_cells(&mut cells);
        cells.dedup();
        for cell in cells {
            self.positions.entry(cell).or_default().push(id);
        }
    }
}

fn sort_cells(cells: &mut [IVec2]) {
    cells.sort_unstable_by_key(|cell| (cell.y, cell.x));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Finish, Food, Wall};
    use proptest::prelude::*;

    fn sample_entities() -> Vec<Entity> {
        vec![
            Wall::new(0, 10, 12, 1).into(),
            Wall::new(0, 0, 1, 10).into(),
            Food::new(4, 9).into(),
            Finish::new(8, 7).into(),
        ]
    }

    #[test]
    fn test_wall_cells_report_wall() {
        let index = InteractionIndex::build(&sample_entities());
        assert!(index.get_interactions(IVec2::new(3, 10)).contains(Interaction::Wall));
        assert!(index.get_interactions(IVec2::new(0, 4)).contains(Interaction::Wall));
    }

    #[test]
    fn test_empty_cells_report_nothing() {
        let index = InteractionIndex::build(&sample_entities());
        // Next to a wall: only an uncharged conductive group lives here
        assert!(index.get_interactions(IVec2::new(3, 9)).is_empty());
        assert!(index.get_interactions(IVec2::new(5, 5)).is_empty());
        assert!(index.get_interactions(IVec2::new(-100, 9999)).is_empty());
    }

    #[test]
    fn test_finish_interacts_above_and_collides_inside() {
        let index = InteractionIndex::build(&sample_entities());
        let above = index.get_interactions(IVec2::new(9, 6));
        assert!(above.contains(Interaction::Finish));
        assert!(!above.contains(Interaction::Wall));
        assert!(index.get_interactions(IVec2::new(9, 8)).contains(Interaction::Wall));
    }

    #[test]
    fn test_eaten_food_disappears() {
        let mut index = InteractionIndex::build(&sample_entities());
        let food = IVec2::new(4, 9);
        assert!(index.get_interactions(food).contains(Interaction::Food));

        assert_eq!(index.update_eaten_food(food), Some(2));
        assert!(!index.get_interactions(food).contains(Interaction::Food));

        // Second call is a no-op
        assert_eq!(index.update_eaten_food(food), None);
        assert!(!index.get_interactions(food).contains(Interaction::Food));

        index.restore_food(food, 2);
        assert!(index.get_interactions(food).contains(Interaction::Food));
        index.restore_food(food, 2);
        assert_eq!(index.update_eaten_food(food), Some(2));
        assert_eq!(index.update_eaten_food(food), None);
    }

    #[test]
    fn test_update_eaten_food_without_food_keeps_other_groups() {
        let mut index = InteractionIndex::build(&sample_entities());
        let wall = IVec2::new(3, 10);
        assert_eq!(index.update_eaten_food(wall), None);
        assert!(index.get_interactions(wall).contains(Interaction::Wall));
    }

    #[test]
    fn test_update_charge_propagates_to_component() {
        let mut entities = sample_entities();
        let mut index = InteractionIndex::build(&entities);

        // (1, 5) sits right of the vertical wall
        let cell = IVec2::new(1, 5);
        let group = index.charge_group_at(cell).expect("charge group");
        assert_eq!(group.interaction, Interaction::Nothing);
        assert_eq!(group.entities.len(), 2);

        index.update_charge(cell, true, &mut entities);
        assert!(index.get_interactions(cell).contains(Interaction::Charge));
        assert!(entities[0].charged());
        assert!(entities[1].charged());
        assert!(!entities[2].charged());

        index.update_charge(cell, false, &mut entities);
        assert!(index.get_interactions(cell).is_empty());
        assert!(!entities[0].charged());
    }

    #[test]
    fn test_charged_entity_starts_as_charge() {
        let mut wall = Wall::new(3, 3, 1, 1);
        wall.charge = true;
        let index = InteractionIndex::build(&[wall.into()]);
        assert!(index.get_interactions(IVec2::new(3, 2)).contains(Interaction::Charge));
    }

    #[test]
    fn test_interaction_set_iter() {
        let set: InteractionSet = [Interaction::Food, Interaction::Nothing, Interaction::Wall]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Interaction::Wall, Interaction::Food]
        );
        assert!(set.is_passable());
    }

    proptest! {
        #[test]
        fn prop_open_room_interior_is_empty(w in 3i32..20, h in 3i32..20, px in 0i32..100, py in 0i32..100) {
            let entities: Vec<Entity> = vec![
                Wall::new(0, h + 1, w + 2, 1).into(),
                Wall::new(0, 0, w + 2, 1).into(),
            ];
            let index = InteractionIndex::build(&entities);
            // Interior cells at least two rows from the floor and ceiling
            let cell = IVec2::new(1 + px % w, 2 + py % (h - 2).max(1));
            prop_assume!(cell.y < h);
            prop_assert!(index.get_interactions(cell).is_empty());
        }

        #[test]
        fn prop_eaten_food_never_reported(x in 1i32..30, y in 1i32..30, repeats in 1usize..4) {
            let entities: Vec<Entity> = vec![Food::new(x, y).into()];
            let mut index = InteractionIndex::build(&entities);
            let pos = IVec2::new(x, y);
            prop_assert_eq!(index.update_eaten_food(pos), Some(0));
            for _ in 0..repeats {
                prop_assert_eq!(index.update_eaten_food(pos), None);
                prop_assert!(!index.get_interactions(pos).contains(Interaction::Food));
            }
        }
    }
}
