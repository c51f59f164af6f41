// UI module - Slint window and frame loop
//
// This module contains:
// - GuiController: wires the Slint window to the session and drives the frame timer

pub mod controller;

pub use controller::GuiController;
