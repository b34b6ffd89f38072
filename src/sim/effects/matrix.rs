//! Falling glyph rain; purely cosmetic

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlyphColumn, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities};

const GLYPH_SIZE: f32 = 20.0;
const GLYPHS_PER_COLUMN: usize = 20;
const MUTATION_CHANCE: f32 = 0.05;

fn random_glyph(rng: &mut impl Rng) -> char {
    let code = if rng.random::<f32>() < 0.5 {
        0x30A0 + rng.random_range(0..96) // katakana
    } else if rng.random::<f32>() < 0.5 {
        0x3040 + rng.random_range(0..96) // hiragana
    } else {
        0x4E00 + rng.random_range(0..0x51FF) // CJK ideographs
    };
    char::from_u32(code).unwrap_or('0')
}

#[derive(Debug, Clone)]
struct Column {
    x: f32,
    speed: f32,
    /// (y, glyph), head first
    glyphs: Vec<(f32, char)>,
}

impl Column {
    fn new(x: f32, rng: &mut impl Rng) -> Self {
        Self {
            x,
            speed: rng.random_range(2.0..5.0),
            glyphs: (0..GLYPHS_PER_COLUMN)
                .map(|i| (-(i as f32) * GLYPH_SIZE, random_glyph(rng)))
                .collect(),
        }
    }

    fn advance(&mut self, height: f32, rng: &mut impl Rng) {
        for (y, glyph) in &mut self.glyphs {
            *y += self.speed;
            if rng.random::<f32>() < MUTATION_CHANCE {
                *glyph = random_glyph(rng);
            }
        }
        // Head fell off the bottom: recycle it above the tail
        if self.glyphs.first().is_some_and(|(y, _)| *y > height) {
            let tail_y = self.glyphs.last().map_or(0.0, |(y, _)| *y);
            let mut head = self.glyphs.remove(0);
            head.0 = tail_y - GLYPH_SIZE;
            self.glyphs.push(head);
        }
    }
}

pub struct Matrix {
    active: bool,
    columns: Vec<Column>,
    width: f32,
    rng: Pcg32,
}

impl Matrix {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            columns: Vec::new(),
            width: bounds.width,
            rng,
        }
    }

    fn rebuild(&mut self, width: f32) {
        self.width = width;
        let count = (width / GLYPH_SIZE) as usize;
        self.columns = (0..count)
            .map(|i| Column::new(i as f32 * GLYPH_SIZE, &mut self.rng))
            .collect();
    }
}

impl Effect for Matrix {
    fn kind(&self) -> EffectKind {
        EffectKind::Matrix
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if active && !self.active {
            self.rebuild(self.width);
        }
        if active != self.active {
            log_toggle(self.kind(), active);
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, ctx: &FrameContext, _pool: &WorkerPool) -> BatchReport {
        if !self.active {
            return BatchReport::default();
        }
        if ctx.bounds.width != self.width {
            self.rebuild(ctx.bounds.width);
        }
        for column in &mut self.columns {
            column.advance(ctx.bounds.height, &mut self.rng);
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, _entities: &mut Entities) {}

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Matrix {
            columns: self
                .columns
                .iter()
                .map(|c| GlyphColumn {
                    x: c.x,
                    glyphs: c.glyphs.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::{ctx, pool};
    use rand::SeedableRng;

    #[test]
    fn test_one_column_per_glyph_width() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut matrix = Matrix::new(bounds, Pcg32::seed_from_u64(4));
        matrix.set_active(true, None);
        assert_eq!(matrix.columns.len(), 40);
        assert!(matrix.columns.iter().all(|c| c.glyphs.len() == GLYPHS_PER_COLUMN));
    }

    #[test]
    fn test_columns_wrap_and_never_touch_entities() {
        let bounds = Bounds::new(200.0, 100.0);
        let mut matrix = Matrix::new(bounds, Pcg32::seed_from_u64(4));
        matrix.set_active(true, None);
        let frame = ctx(bounds);
        let pool = pool();
        for _ in 0..500 {
            matrix.update(&frame, &pool);
        }
        for column in &matrix.columns {
            assert_eq!(column.glyphs.len(), GLYPHS_PER_COLUMN);
            assert!(column.glyphs[0].0 <= bounds.height + 5.0);
        }

        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(50.0, 50.0), 10.0);
        let before = entities.balls.clone();
        matrix.apply_force(&frame, &mut entities);
        assert_eq!(entities.balls, before);
    }
}
