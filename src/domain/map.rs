/// Map identifiers and their properties.
/// Maps form a single horizontal chain: Village → Field → Campus.
/// Properties are queried via methods, not stored as flags,
/// so map semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum MapId {
    Village,
    Field,
    Campus,
}

impl MapId {
    pub const ALL: [MapId; 3] = [MapId::Village, MapId::Field, MapId::Campus];
    pub const FIRST: MapId = MapId::Village;

    /// 0-based position in the chain.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<MapId> {
        MapId::ALL.get(i).copied()
    }

    /// The map to the right, if any.
    pub fn next(self) -> Option<MapId> {
        MapId::from_index(self.index() + 1)
    }

    /// The map to the left, if any.
    pub fn prev(self) -> Option<MapId> {
        self.index().checked_sub(1).and_then(MapId::from_index)
    }

    /// Does walking here roll for random encounters?
    pub fn has_encounters(self) -> bool {
        matches!(self, MapId::Field)
    }

    /// Does this map hold the boss zone?
    pub fn has_boss(self) -> bool {
        matches!(self, MapId::Campus)
    }

    /// Location caption shown in the top-left corner of the map screen.
    pub fn caption(self) -> &'static str {
        match self {
            MapId::Village => "The first village (head right)",
            MapId::Field => "Outskirts (enemies appear)",
            MapId::Campus => "Hachioji campus (the boss waits deep inside)",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MapId::Village => "village",
            MapId::Field => "field",
            MapId::Campus => "campus",
        }
    }
}
