// File: crates/canvas-demo/src/lib.rs
// Summary: Demo scene shared by the headless and windowed demos: grid, axes, animated series, pointer crosshair.

use std::cell::Cell;

use canvas_core::{Frame, InteractionState};
use canvas_render_skia::SkiaEngine;
use skia_safe as skia;

/// Plot margins in logical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Insets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Insets {
    fn default() -> Self {
        Self { left: 72.0, right: 24.0, top: 24.0, bottom: 56.0 }
    }
}

/// Slowly-changing state handed to every paint.
pub struct Scene {
    pub title: String,
    pub insets: Insets,
    pub background: skia::Color,
    /// Advanced once per paint; drives the animation.
    pub tick: Cell<u64>,
    /// Samples per sweep of the animated series.
    pub samples: usize,
}

impl Scene {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            insets: Insets::default(),
            background: skia::Color::from_argb(255, 18, 18, 20), // near-black
            tick: Cell::new(0),
            samples: 400,
        }
    }
}

pub fn linspace(start: f32, end: f32, steps: usize) -> Vec<f32> {
    if steps < 2 { return vec![start, end]; }
    let step = (end - start) / (steps as f32 - 1.0);
    (0..steps).map(|i| start + step * i as f32).collect()
}

/// Value of the animated series at `x` in [0, 1] for animation step `tick`.
pub fn wave(x: f32, tick: u64) -> f32 {
    let phase = tick as f32 * 0.05;
    (x * std::f32::consts::TAU * 2.0 + phase).sin() * 0.8 + (x * 17.0 + phase * 0.3).sin() * 0.15
}

/// Draw callback for a [`Scene`] surface.
pub fn draw(frame: Frame<'_, SkiaEngine, Scene>) -> anyhow::Result<()> {
    let scene = frame.aux;
    let tick = scene.tick.get();
    scene.tick.set(tick + 1);

    let canvas = frame.canvas;
    canvas.clear(scene.background);

    let ins = scene.insets;
    let (l, t) = (ins.left, ins.top);
    let r = (frame.width() - ins.right).max(l + 1.0);
    let b = (frame.height() - ins.bottom).max(t + 1.0);

    draw_grid(canvas, l, t, r, b);
    draw_axes(canvas, frame.engine, l, t, r, b);
    draw_series(canvas, l, t, r, b, scene.samples, tick);
    if let Some(state) = frame.interaction {
        draw_crosshair(canvas, frame.engine, &state, l, t, r, b);
    }

    frame.engine.text().draw_left(
        canvas,
        &format!("{}  #{tick}", scene.title),
        l,
        t - 6.0,
        14.0,
        skia::Color::from_argb(255, 210, 210, 220),
        false,
    );
    Ok(())
}

fn draw_grid(canvas: &skia::Canvas, l: f32, t: f32, r: f32, b: f32) {
    let mut paint = skia::Paint::default();
    paint.set_color(skia::Color::from_argb(255, 40, 40, 45));
    paint.set_anti_alias(true);
    paint.set_stroke_width(1.0);

    // verticals
    for x in linspace(l, r, 10) {
        canvas.draw_line((x, t), (x, b), &paint);
    }
    // horizontals
    for y in linspace(t, b, 6) {
        canvas.draw_line((l, y), (r, y), &paint);
    }
}

fn draw_axes(canvas: &skia::Canvas, engine: &SkiaEngine, l: f32, t: f32, r: f32, b: f32) {
    let mut axis_paint = skia::Paint::default();
    axis_paint.set_color(skia::Color::from_argb(255, 180, 180, 190));
    axis_paint.set_anti_alias(true);
    axis_paint.set_stroke_width(1.5);

    canvas.draw_line((l, b), (r, b), &axis_paint);
    canvas.draw_line((l, t), (l, b), &axis_paint);

    let label = skia::Color::from_argb(255, 210, 210, 220);
    for (i, y) in linspace(b, t, 5).into_iter().enumerate() {
        let v = -1.0 + i as f32 * 0.5;
        let text = format!("{v:+.1}");
        let w = engine.text().measure_width(&text, 12.0, true);
        engine.text().draw_left(canvas, &text, l - w - 8.0, y + 4.0, 12.0, label, true);
    }
}

fn draw_series(canvas: &skia::Canvas, l: f32, t: f32, r: f32, b: f32, samples: usize, tick: u64) {
    let n = samples.max(2);
    let sy = |v: f32| -> f32 { b - (v + 1.0) / 2.0 * (b - t) };

    let mut path = skia::Path::new();
    for (i, x) in linspace(0.0, 1.0, n).into_iter().enumerate() {
        let p = (l + x * (r - l), sy(wave(x, tick)));
        if i == 0 { path.move_to(p); } else { path.line_to(p); }
    }

    let mut stroke = skia::Paint::default();
    stroke.set_anti_alias(true);
    stroke.set_style(skia::paint::Style::Stroke);
    stroke.set_stroke_width(2.0);
    stroke.set_color(skia::Color::from_argb(255, 64, 160, 255));
    canvas.draw_path(&path, &stroke);
}

fn draw_crosshair(canvas: &skia::Canvas, engine: &SkiaEngine, state: &InteractionState, l: f32, t: f32, r: f32, b: f32) {
    let Some(p) = state.position else { return };
    if !state.hovered && !state.pressed {
        return;
    }
    let (x, y) = (p.x.clamp(l, r), p.y.clamp(t, b));
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    paint.set_stroke_width(1.0);
    paint.set_color(if state.pressed {
        skia::Color::from_argb(255, 255, 230, 70)
    } else {
        skia::Color::from_argb(160, 200, 200, 210)
    });
    canvas.draw_line((x, t), (x, b), &paint);
    canvas.draw_line((l, y), (r, y), &paint);

    let value = 1.0 - (y - t) / (b - t).max(1.0) * 2.0;
    engine.text().draw_left(canvas, &format!("{value:+.3}"), x + 6.0, y - 6.0, 12.0, paint.color(), true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_ends() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0, 4.0]);
    }

    #[test]
    fn wave_stays_in_plot_range() {
        for tick in [0, 7, 1000] {
            for x in linspace(0.0, 1.0, 200) {
                assert!(wave(x, tick).abs() <= 1.0);
            }
        }
    }
}
