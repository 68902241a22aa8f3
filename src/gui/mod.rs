//! Native GUI for hydra.
//!
//! Runs the host inside an eframe/egui window. [`frame`] implements the
//! host-framework collaborator on `egui::Ui`.

pub mod app;
pub mod demo;
pub mod frame;
pub mod theme;
