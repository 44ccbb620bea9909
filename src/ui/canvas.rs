// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotated frame display and player picking.
//!
//! The frame is fitted and centered in the available space. Detected boxes
//! are mapped from the frame's native pixels to the rect the image is
//! painted into, recomputed every frame so window resizes never desync the
//! hit regions from the picture.

use crate::models::player::{DetectedPlayer, ImageDimensions, Point};
use crate::util::geometry::{self, RenderedBox, Size};

const SELECTED_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 140, 0);
const MARK_COLOR: egui::Color32 = egui::Color32::from_rgb(60, 220, 90);
const HOVER_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(60, 220, 90, 40);

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// A box was clicked.
    TogglePlayer(u32),
    /// The image was clicked outside every box, in native frame pixels.
    ClickAt(Point),
}

/// Paint `texture` fitted and centered in the space left in `ui`.
/// Returns the rect the image occupies, or `None` if nothing could be drawn.
pub fn paint_frame(ui: &mut egui::Ui, texture: &egui::TextureHandle, native: ImageDimensions) -> Option<egui::Rect> {
    let available = ui.available_size();
    let fitted = geometry::fit_within(native, Size::new(available.x as f64, available.y as f64));
    if fitted.width <= 0.0 || fitted.height <= 0.0 {
        return None;
    }

    // Center the image
    let x_offset = (available.x - fitted.width as f32) / 2.0;
    let y_offset = (available.y - fitted.height as f32) / 2.0;
    let image_rect = egui::Rect::from_min_size(
        ui.min_rect().min + egui::vec2(x_offset, y_offset),
        egui::vec2(fitted.width as f32, fitted.height as f32),
    );

    ui.painter().image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
    Some(image_rect)
}

fn rendered_size(image_rect: &egui::Rect) -> Size {
    Size::new(image_rect.width() as f64, image_rect.height() as f64)
}

/// Screen rect of a box given relative to the image's top-left corner.
pub fn screen_rect(image_rect: &egui::Rect, rendered: &RenderedBox) -> egui::Rect {
    egui::Rect::from_min_max(
        image_rect.min + egui::vec2(rendered.left as f32, rendered.top as f32),
        image_rect.min + egui::vec2(rendered.right() as f32, rendered.bottom() as f32),
    )
}

/// Orange outline with an id tag.
pub fn draw_selected_box(painter: &egui::Painter, rect: egui::Rect, player_id: u32) {
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(3.0, SELECTED_COLOR));
    draw_corner_marks(painter, rect, MARK_COLOR, true);

    let label = format!("#{}", player_id);
    let font = egui::FontId::proportional(13.0);
    let galley = painter.layout_no_wrap(label, font, egui::Color32::WHITE);
    let tag = egui::Rect::from_min_size(
        rect.left_top() - egui::vec2(0.0, galley.size().y + 4.0),
        galley.size() + egui::vec2(8.0, 4.0),
    );
    painter.rect_filled(tag, 2.0, SELECTED_COLOR);
    painter.galley(tag.min + egui::vec2(4.0, 2.0), galley, egui::Color32::WHITE);
}

/// L-shaped marks on each corner of `rect`.
pub fn draw_corner_marks(painter: &egui::Painter, rect: egui::Rect, color: egui::Color32, selected: bool) {
    let len = geometry::corner_mark_size(rect.width() as f64, rect.height() as f64, selected) as f32;
    let stroke = egui::Stroke::new(2.0, color);
    let corners = [
        (rect.left_top(), egui::vec2(len, 0.0), egui::vec2(0.0, len)),
        (rect.right_top(), egui::vec2(-len, 0.0), egui::vec2(0.0, len)),
        (rect.left_bottom(), egui::vec2(len, 0.0), egui::vec2(0.0, -len)),
        (rect.right_bottom(), egui::vec2(-len, 0.0), egui::vec2(0.0, -len)),
    ];
    for (corner, horizontal, vertical) in corners {
        painter.line_segment([corner, corner + horizontal], stroke);
        painter.line_segment([corner, corner + vertical], stroke);
    }
}

/// Display the detected frame and handle player picking.
pub fn show(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    native: ImageDimensions,
    players: &[DetectedPlayer],
    selected: Option<u32>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let Some(texture) = texture else {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("Loading frame...").color(egui::Color32::WHITE));
            });
            return;
        };
        let Some(image_rect) = paint_frame(ui, texture, native) else {
            return;
        };
        let rendered = rendered_size(&image_rect);

        let boxes: Vec<(u32, egui::Rect)> = players
            .iter()
            .filter_map(|p| {
                geometry::scale_box(&p.bbox, native, rendered).map(|b| (p.id, screen_rect(&image_rect, &b)))
            })
            .collect();

        let response = ui.allocate_rect(image_rect, egui::Sense::click());
        let hovered = response
            .hover_pos()
            .and_then(|pos| boxes.iter().rev().find(|(_, r)| r.contains(pos)).map(|(id, _)| *id));

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if let Some((id, _)) = boxes.iter().rev().find(|(_, r)| r.contains(pos)) {
                    action = CanvasAction::TogglePlayer(*id);
                } else if image_rect.contains(pos) {
                    let local = Point::new((pos.x - image_rect.min.x) as f64, (pos.y - image_rect.min.y) as f64);
                    if let Some(native_point) = geometry::to_native(local, native, rendered) {
                        action = CanvasAction::ClickAt(native_point);
                    }
                }
            }
        }
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let painter = ui.painter();
        for (id, rect) in &boxes {
            if Some(*id) == selected {
                continue;
            }
            if Some(*id) == hovered {
                painter.rect_filled(*rect, 0.0, HOVER_COLOR);
            }
            draw_corner_marks(painter, *rect, MARK_COLOR, false);
        }
        // Selected box last so it sits on top
        if let Some((id, rect)) = boxes.iter().find(|(id, _)| Some(*id) == selected) {
            draw_selected_box(painter, *rect, *id);
        }
    });

    action
}
