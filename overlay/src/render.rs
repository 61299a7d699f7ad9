use macroquad::prelude::*;

use crate::stage::{Field, Stage};

const EVENT_CENTER_Y: f32 = 80f32;
const NAME_Y: f32 = 170f32;
const SCORE_Y: f32 = 178f32;

const BAR_Y: f32 = 120f32;
const BAR_HEIGHT: f32 = 80f32;
const NAME_BAR_WIDTH: f32 = 640f32;
const NAME_BAR_WIDE_WIDTH: f32 = 760f32;
const SCORE_BAR_WIDTH: f32 = 120f32;

const P1_BAR_X: f32 = 120f32;
const P2_BAR_X: f32 = 1920f32 - P1_BAR_X - NAME_BAR_WIDTH - SCORE_BAR_WIDTH;
const P2_BAR_WIDE_X: f32 = 1920f32 - P1_BAR_X - NAME_BAR_WIDE_WIDTH;

const BAR_COLOR: Color = Color::new(0.05, 0.05, 0.12, 0.85);
const SCORE_BAR_COLOR: Color = Color::new(0.55, 0.09, 0.09, 0.9);

/// Draws one frame of the overlay from the shared element state. All text
/// alpha is the element's own opacity multiplied by its group layer and the
/// header, so the entrance fade and the layout crossfade dim everything they
/// cover at once.
pub fn draw(stage: &dyn Stage) {
    let header = stage.opacity(Field::Header);
    if header == 0.0 {
        return;
    }
    let background_layer = stage.opacity(Field::BackgroundLayer) * header;
    let text_layer = stage.opacity(Field::TextLayer) * header;

    draw_backgrounds(stage, background_layer);

    draw_event(stage, header);

    let (p1_x, p2_x) = if stage.has_class(Field::Player1Name, "name-text-wide") {
        (P1_BAR_X + 30f32, P2_BAR_WIDE_X + 30f32)
    } else {
        (P1_BAR_X + 30f32, P2_BAR_X + 30f32)
    };
    draw_name(stage, Field::Player1Name, p1_x, text_layer);
    draw_name(stage, Field::Player2Name, p2_x, text_layer);

    if stage.is_visible(Field::Player1ScoreBox) {
        draw_score(stage, Field::Player1Score, P1_BAR_X + NAME_BAR_WIDTH, text_layer);
    }
    if stage.is_visible(Field::Player2ScoreBox) {
        draw_score(stage, Field::Player2Score, P2_BAR_X + NAME_BAR_WIDTH, text_layer);
    }
}

fn draw_backgrounds(stage: &dyn Stage, alpha: f32) {
    if stage.is_visible(Field::NameBackground) {
        draw_bar(P1_BAR_X, NAME_BAR_WIDTH, BAR_COLOR, alpha);
        draw_bar(P2_BAR_X, NAME_BAR_WIDTH, BAR_COLOR, alpha);
    }
    if stage.is_visible(Field::NameBackgroundWide) {
        draw_bar(P1_BAR_X, NAME_BAR_WIDE_WIDTH, BAR_COLOR, alpha);
        draw_bar(P2_BAR_WIDE_X, NAME_BAR_WIDE_WIDTH, BAR_COLOR, alpha);
    }
    if stage.is_visible(Field::ScoreBackground) {
        draw_bar(P1_BAR_X + NAME_BAR_WIDTH, SCORE_BAR_WIDTH, SCORE_BAR_COLOR, alpha);
        draw_bar(P2_BAR_X + NAME_BAR_WIDTH, SCORE_BAR_WIDTH, SCORE_BAR_COLOR, alpha);
    }
}

fn draw_bar(x: f32, width: f32, color: Color, alpha: f32) {
    draw_rectangle(
        x,
        BAR_Y,
        width,
        BAR_HEIGHT,
        Color {
            a: color.a * alpha,
            ..color
        },
    );
}

fn draw_event(stage: &dyn Stage, header_alpha: f32) {
    let text = stage.text(Field::Event);
    if text.is_empty() {
        return;
    }
    let alpha = header_alpha * stage.opacity(Field::Event);
    let dims = measure_text(&text, None, 48, 1.0);
    draw_text_ex(
        &text,
        (screen_width() - dims.width) / 2f32,
        EVENT_CENTER_Y,
        TextParams {
            font_size: 48,
            color: Color { a: alpha, ..WHITE },
            ..Default::default()
        },
    );
}

fn draw_name(stage: &dyn Stage, field: Field, x: f32, layer_alpha: f32) {
    let text = stage.text(field);
    if text.is_empty() {
        return;
    }
    let alpha = layer_alpha * stage.opacity(field);
    draw_text_ex(
        &text,
        x,
        NAME_Y,
        TextParams {
            font_size: 36,
            color: Color { a: alpha, ..WHITE },
            ..Default::default()
        },
    );
}

fn draw_score(stage: &dyn Stage, field: Field, bar_x: f32, layer_alpha: f32) {
    let text = stage.text(field);
    if text.is_empty() {
        return;
    }
    let alpha = layer_alpha * stage.opacity(field);
    let dims = measure_text(&text, None, 44, 1.0);
    draw_text_ex(
        &text,
        bar_x + (SCORE_BAR_WIDTH - dims.width) / 2f32,
        SCORE_Y,
        TextParams {
            font_size: 44,
            color: Color { a: alpha, ..WHITE },
            ..Default::default()
        },
    );
}
