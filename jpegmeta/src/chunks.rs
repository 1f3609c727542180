use log::{info, warn};

use crate::ChunkError;

/// Slots for an ICC profile split across APP2 segments.
///
/// The total declared by the first chunk fixes the number of slots. Chunks
/// may arrive in any order, each is stored under its 1-based index.
#[derive(Debug, Default)]
pub struct IccChunks {
    slots: Option<Vec<Option<Vec<u8>>>>,
}

impl IccChunks {
    pub fn new() -> IccChunks {
        IccChunks::default()
    }

    pub fn insert(&mut self, number: u8, total: u8, data: Vec<u8>) -> Result<(), ChunkError> {
        let slots = self
            .slots
            .get_or_insert_with(|| vec![None; total as usize]);

        if total as usize != slots.len() {
            return Err(ChunkError::InconsistentChunkCount {
                expected: slots.len(),
                found: total,
            });
        }

        if number == 0 || number as usize > slots.len() {
            return Err(ChunkError::InvalidChunkNumber { number, total });
        }

        let slot = &mut slots[number as usize - 1];
        if slot.is_some() {
            return Err(ChunkError::DuplicatedChunk { number });
        }
        *slot = Some(data);
        Ok(())
    }

    /// Whether a chunk has been seen and every slot is filled.
    pub fn is_complete(&self) -> bool {
        match &self.slots {
            Some(slots) => !slots.is_empty() && slots.iter().all(Option::is_some),
            None => false,
        }
    }

    /// Concatenates the chunks in index order.
    ///
    /// `None` if no chunk was seen or any slot is still empty.
    pub fn assemble(self) -> Option<Vec<u8>> {
        let slots = self.slots?;
        if slots.is_empty() {
            return None;
        }

        let mut profile = Vec::new();
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(data) => profile.extend(data),
                None => {
                    warn!("ICC profile chunk {} missing, dropping profile", index + 1);
                    return None;
                }
            }
        }
        info!("Assembled {} bytes of ICC profile data", profile.len());
        Some(profile)
    }
}
