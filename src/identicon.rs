use crate::chain::Address;
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use ratatui::{
    style::{
        Color,
        Style,
    },
    text::{
        Line,
        Span,
    },
};
use sha2::{
    Digest,
    Sha256,
};

const SIZE: usize = 8;

const PALETTE: [Color; 8] = [
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightRed,
    Color::LightGreen,
    Color::LightBlue,
];

/// Blockies-style avatar: an 8x8 mirrored bitmap seeded from the
/// address, squeezed into 4 terminal rows with half blocks.
pub fn lines(address: &Address) -> Vec<Line<'static>> {
    let (cells, color) = pattern(address);
    let style = Style::default().fg(color);
    let mut out = Vec::with_capacity(SIZE / 2);
    for y in (0..SIZE).step_by(2) {
        let mut row = String::with_capacity(SIZE);
        for x in 0..SIZE {
            let top = cells[y][x];
            let bottom = cells[y + 1][x];
            row.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push(Line::from(Span::styled(row, style)));
    }
    out
}

fn pattern(address: &Address) -> ([[bool; SIZE]; SIZE], Color) {
    let digest = Sha256::digest(address.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    let mut rng = StdRng::from_seed(seed);

    let color = PALETTE[rng.random_range(0..PALETTE.len())];
    let mut cells = [[false; SIZE]; SIZE];
    for row in cells.iter_mut() {
        for x in 0..SIZE / 2 {
            let on: bool = rng.random();
            row[x] = on;
            row[SIZE - 1 - x] = on;
        }
    }
    (cells, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern__is_deterministic_per_address() {
        let address = Address::new([3u8; 32]);
        assert_eq!(pattern(&address), pattern(&address));
    }

    #[test]
    fn pattern__is_horizontally_mirrored() {
        let (cells, _) = pattern(&Address::new([9u8; 32]));
        for row in cells {
            for x in 0..SIZE / 2 {
                assert_eq!(row[x], row[SIZE - 1 - x]);
            }
        }
    }
}
