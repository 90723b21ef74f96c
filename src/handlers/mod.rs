// src/handlers/mod.rs

pub mod hotels;
