use shared::domain::{FamilySide, RegistrationRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuestStatistics {
    pub bride: usize,
    pub groom: usize,
}

impl GuestStatistics {
    pub fn count_for(&self, side: FamilySide) -> usize {
        match side {
            FamilySide::Bride => self.bride,
            FamilySide::Groom => self.groom,
        }
    }
}

/// Per-side counts over a snapshot. Rows with an unrecognized or missing side
/// are counted on neither side.
pub fn guest_statistics(records: &[RegistrationRecord]) -> GuestStatistics {
    records
        .iter()
        .fold(GuestStatistics::default(), |mut stats, record| {
            match record.side() {
                Some(FamilySide::Bride) => stats.bride += 1,
                Some(FamilySide::Groom) => stats.groom += 1,
                None => {}
            }
            stats
        })
}
