use crate::facility::{FacilityResolver, FacilityStore};
use std::sync::Mutex;

pub struct AppState {
    pub store: Mutex<FacilityStore>,
    pub resolver: Mutex<FacilityResolver>,
}
