// ui.rs - Controls and grid painter for the relay-backed viewer

use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use std::time::{Duration, Instant};

use life_relay::patterns::PATTERNS;
use life_relay::{Coordinate, GridSize};

use crate::{GameOfLife, GameOfLifeInterface};

const MAX_BOARD_PX: f32 = 760.0;
const GRID_SIDES: std::ops::RangeInclusive<u32> = 5..=200;

impl eframe::App for GameOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_relay();

        // Ask for the next generation once the interval has passed
        let due = self.last_update.elapsed() >= self.update_interval;
        if self.is_running && !self.is_pending() && due {
            self.request_generation();
            self.last_update = Instant::now();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Conway's Game of Life (Background Relay)");

            // Controls
            ui.horizontal(|ui| {
                let button_text = if self.is_running { "⏸ Pause" } else { "▶ Start" };
                if ui.button(button_text).clicked() {
                    self.is_running = !self.is_running;
                    if self.is_running {
                        self.last_update = Instant::now();
                    }
                }

                let step = egui::Button::new("⏭ Step");
                if ui.add_enabled(!self.is_running && !self.is_pending(), step).clicked() {
                    self.request_generation();
                }

                if ui.button("⏹ Clear").clicked() {
                    self.is_running = false;
                    self.clear_grid();
                }

                if ui.button("🎲 Random").clicked() {
                    self.is_running = false;
                    self.apply_random_pattern();
                }

                ui.separator();

                // Pattern dropdown
                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.button("Apply Pattern").clicked() {
                    self.is_running = false;
                    self.apply_selected_pattern();
                }

                ui.separator();

                ui.label(format!("Generation: {}", self.generation));
            });

            ui.separator();

            // Speed control
            ui.horizontal(|ui| {
                ui.label("Speed:");
                let mut speed = 1000.0 / self.update_interval.as_millis().max(1) as f32;
                if ui.add(egui::Slider::new(&mut speed, 0.5..=90.0).suffix(" gen/sec")).changed() {
                    self.update_interval = Duration::from_millis((1000.0 / speed) as u64);
                }

                ui.separator();

                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });

            // Settings
            ui.collapsing("Settings", |ui| {
                ui.horizontal(|ui| {
                    ui.label("Grid size:");
                    let mut side = self.grid_size.width.max(self.grid_size.height);
                    if ui.add(egui::Slider::new(&mut side, GRID_SIDES)).changed() {
                        if let Ok(size) = GridSize::square(side) {
                            self.is_running = false;
                            self.resize_grid(size);
                        }
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Alive probability:");
                    ui.add(egui::Slider::new(&mut self.density, 0.0..=1.0).step_by(0.05));
                });
                ui.horizontal(|ui| {
                    ui.label("Interval:");
                    let mut interval_ms = self.update_interval.as_millis() as u64;
                    let slider = egui::Slider::new(&mut interval_ms, 10..=2000).suffix(" ms");
                    if ui.add(slider).changed() {
                        self.update_interval = Duration::from_millis(interval_ms);
                    }
                });
            });

            ui.separator();

            let relay_line = match (self.relay_ready(), self.is_pending()) {
                (false, _) => "Relay not ready, stepping locally",
                (true, true) => "⏳ Relay computing...",
                (true, false) => "Relay idle",
            };
            ui.label(format!("{relay_line} | {}", self.status));
            ui.label("Click cells to toggle them alive/dead. Use Start/Pause to run.");

            ui.separator();

            // Draw the grid
            let cols = self.grid_size.width as usize;
            let rows = self.grid_size.height as usize;
            let spacing = if cols.max(rows) > 100 { 0.0 } else { 0.5 };
            let box_size = ((MAX_BOARD_PX / cols.max(rows) as f32) - spacing).clamp(1.0, 15.0);
            let pitch = box_size + spacing;

            let start_pos = ui.cursor().min;
            let total_size =
                Vec2::new(pitch * cols as f32 - spacing, pitch * rows as f32 - spacing);

            let (response, painter) = ui.allocate_painter(total_size, egui::Sense::click());

            painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, self.dead_color);

            // Only live cells are painted over the background
            for cell in &self.cells {
                if !self.grid_size.contains(*cell) {
                    continue;
                }
                let x = start_pos.x + cell.x as f32 * pitch;
                let y = start_pos.y + cell.y as f32 * pitch;
                let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));
                painter.rect_filled(rect, 1.0, self.live_color);
            }

            if spacing > 0.0 {
                let stroke = Stroke::new(0.2, Color32::from_gray(60));
                for col in 0..=cols {
                    let x = start_pos.x + col as f32 * pitch - spacing / 2.0;
                    let top = egui::pos2(x, start_pos.y);
                    painter.line_segment([top, top + Vec2::new(0.0, total_size.y)], stroke);
                }
                for row in 0..=rows {
                    let y = start_pos.y + row as f32 * pitch - spacing / 2.0;
                    let left = egui::pos2(start_pos.x, y);
                    painter.line_segment([left, left + Vec2::new(total_size.x, 0.0)], stroke);
                }
            }

            // Handle clicking (only when not running)
            if !self.is_running && response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let col = ((pos.x - start_pos.x) / pitch).floor() as i32;
                    let row = ((pos.y - start_pos.y) / pitch).floor() as i32;
                    self.toggle_cell(Coordinate::new(col, row));
                }
            }

            ui.separator();

            // Statistics
            let live_cells = self.cells.len();
            let total = self.grid_size.area() as usize;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {}", live_cells));
                ui.label(format!("Dead cells: {}", total.saturating_sub(live_cells)));
                ui.label(format!("Population: {:.1}%", (live_cells as f32 / total as f32) * 100.0));
            });
        });

        // Keep polling while the relay is loading or computing
        if self.is_running || self.is_pending() || !self.relay_ready() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
