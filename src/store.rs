// src/store.rs

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::hotel::Hotel;

/// In-memory hotel repository shared by all handlers.
#[derive(Debug, Clone, Default)]
pub struct HotelStore {
    hotels: Arc<RwLock<HashMap<Uuid, Hotel>>>,
}

impl HotelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All hotels, oldest first.
    pub fn list(&self) -> Vec<Hotel> {
        let mut hotels: Vec<Hotel> = self.hotels.read().values().cloned().collect();
        hotels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        hotels
    }

    pub fn get(&self, id: Uuid) -> Option<Hotel> {
        self.hotels.read().get(&id).cloned()
    }

    pub fn insert(&self, hotel: Hotel) {
        self.hotels.write().insert(hotel.id, hotel);
    }

    /// Replaces an existing hotel. Returns `false` if `hotel.id` is unknown.
    pub fn replace(&self, hotel: Hotel) -> bool {
        match self.hotels.write().get_mut(&hotel.id) {
            Some(existing) => {
                *existing = hotel;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> Option<Hotel> {
        self.hotels.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.hotels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.read().is_empty()
    }
}
