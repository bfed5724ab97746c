// ui.rs - Draws the board and forwards control keys to the engine

use std::time::Duration;

use eframe::egui;
use egui::{Color32, Rect, Vec2};
use gol::{Key, State};

use crate::GridApp;

impl eframe::App for GridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // Keyboard controls, same letters as the headless runner
        let (save, pause, quit) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::P),
                i.key_pressed(egui::Key::Q),
            )
        });
        if quit && self.is_finished() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if !self.is_finished() {
            if save { self.send_key(Key::Save); }
            if pause { self.send_key(Key::Pause); }
            if quit { self.send_key(Key::Quit); }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Conway's Game of Life");

            // Controls
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!self.is_finished(), |ui| {
                    let button_text = if self.state == State::Paused { "▶ Resume" } else { "⏸ Pause" };
                    if ui.button(button_text).clicked() {
                        self.send_key(Key::Pause);
                    }
                    if ui.button("💾 Save").clicked() {
                        self.send_key(Key::Save);
                    }
                    if ui.button("⏹ Quit").clicked() {
                        self.send_key(Key::Quit);
                    }
                });

                ui.separator();

                ui.label(format!("Turn: {}", self.turn));
                ui.label(format!("State: {}", self.state));

                ui.separator();

                // Show current colors
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });

            ui.separator();

            ui.label("Keys: S saves a snapshot, P pauses or resumes, Q quits.");
            if let Some(saved) = &self.last_saved {
                ui.label(format!("Last saved: {saved}"));
            }
            if let Some(outcome) = &self.outcome {
                ui.label(format!("{outcome} (press Q to close)"));
            }

            ui.separator();

            // Fit the whole board into the remaining space
            let available = ui.available_size() - Vec2::new(0.0, 30.0);
            let box_size = (available.x / self.width as f32)
                .min(available.y / self.height as f32)
                .max(1.0);
            let total_size = Vec2::new(box_size * self.width as f32, box_size * self.height as f32);

            let start_pos = ui.cursor().min;
            let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

            painter.rect_filled(
                Rect::from_min_size(start_pos, total_size),
                0.0,
                self.dead_color,
            );

            // Only live cells need painting over the background
            for (i, _) in self.cells.iter().enumerate().filter(|&(_, &alive)| alive) {
                let x = start_pos.x + (i % self.width) as f32 * box_size;
                let y = start_pos.y + (i / self.width) as f32 * box_size;
                let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));
                painter.rect_filled(rect, 0.0, self.live_color);
            }

            ui.separator();

            // Statistics
            let live_cells = self.live_cells();
            let total = (self.width * self.height) as f32;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {live_cells}"));
                if let Some(reported) = self.reported_alive {
                    ui.label(format!("Last report: {reported}"));
                }
                ui.label(format!("Population: {:.1}%", live_cells as f32 / total * 100.0));
                ui.label(
                    egui::RichText::new(format!("{}x{}", self.width, self.height))
                        .color(Color32::GRAY),
                );
            });
        });

        // Keep pulling events while the engine is running
        if !self.is_finished() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
