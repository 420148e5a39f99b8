use super::{constants::ObjectKind, object::WorldObj};

/// Grid coordinates `(x, y)`, with `y` growing downwards
pub type Pos = (usize, usize);

/// Encoded observation, one `(kind, color, state)` triple per cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<[u8; 3]>,
}

impl Image {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![[ObjectKind::Unseen as u8, 0, 0]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: [u8; 3]) {
        self.data[y * self.width + x] = value;
    }
}

/// A rectangular grid of optional world objects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<WorldObj>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width >= 3 && height >= 3, "grid must be at least 3x3");
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&WorldObj> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[y * self.width + x].as_ref()
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut WorldObj> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[y * self.width + x].as_mut()
    }

    pub fn set(&mut self, x: usize, y: usize, obj: Option<WorldObj>) {
        assert!(self.in_bounds(x, y), "({x}, {y}) is outside the grid");
        self.cells[y * self.width + x] = obj;
    }

    /// Remove and return the object at `(x, y)`
    pub fn take(&mut self, x: usize, y: usize) -> Option<WorldObj> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[y * self.width + x].take()
    }

    pub fn horz_wall(&mut self, x: usize, y: usize, length: usize) {
        for i in x..(x + length).min(self.width) {
            self.set(i, y, Some(WorldObj::wall()));
        }
    }

    pub fn vert_wall(&mut self, x: usize, y: usize, length: usize) {
        for j in y..(y + length).min(self.height) {
            self.set(x, j, Some(WorldObj::wall()));
        }
    }

    /// Outline the `w x h` rectangle whose top-left corner is `(x, y)` with walls
    pub fn wall_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        self.horz_wall(x, y, w);
        self.horz_wall(x, y + h - 1, w);
        self.vert_wall(x, y, h);
        self.vert_wall(x + w - 1, y, h);
    }

    /// Iterate over occupied cells in row-major order
    pub fn objects(&self) -> impl Iterator<Item = (Pos, &WorldObj)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(idx, cell)| {
                cell.as_ref().map(|obj| ((idx % width, idx / width), obj))
            })
    }

    /// Rotate the grid a quarter turn counter-clockwise
    pub fn rotate_left(&self) -> Self {
        let mut grid = Grid {
            width: self.height,
            height: self.width,
            cells: vec![None; self.width * self.height],
        };

        for i in 0..self.width {
            for j in 0..self.height {
                grid.set(j, grid.height - 1 - i, self.get(i, j).cloned());
            }
        }

        grid
    }

    /// Extract the `width x height` window whose top-left corner is `(top_x, top_y)`
    ///
    /// Cells outside this grid read as walls.
    pub fn slice(&self, top_x: isize, top_y: isize, width: usize, height: usize) -> Self {
        let mut grid = Grid {
            width,
            height,
            cells: vec![None; width * height],
        };

        for j in 0..height {
            for i in 0..width {
                let x = top_x + i as isize;
                let y = top_y + j as isize;
                let cell = if x >= 0 && y >= 0 && self.in_bounds(x as usize, y as usize) {
                    self.get(x as usize, y as usize).cloned()
                } else {
                    Some(WorldObj::wall())
                };
                grid.set(i, j, cell);
            }
        }

        grid
    }

    /// Propagate visibility outwards from `agent_pos`, clearing every cell the agent cannot see
    ///
    /// **Returns** the visibility mask, indexed `y * width + x`
    pub fn process_vis(&mut self, agent_pos: Pos) -> Vec<bool> {
        let (w, h) = (self.width, self.height);
        let mut mask = vec![false; w * h];
        mask[agent_pos.1 * w + agent_pos.0] = true;

        let opaque =
            |grid: &Grid, i: usize, j: usize| grid.get(i, j).is_some_and(|c| !c.see_behind());

        for j in (0..h).rev() {
            for i in 0..w - 1 {
                if !mask[j * w + i] || opaque(self, i, j) {
                    continue;
                }
                mask[j * w + i + 1] = true;
                if j > 0 {
                    mask[(j - 1) * w + i + 1] = true;
                    mask[(j - 1) * w + i] = true;
                }
            }

            for i in (1..w).rev() {
                if !mask[j * w + i] || opaque(self, i, j) {
                    continue;
                }
                mask[j * w + i - 1] = true;
                if j > 0 {
                    mask[(j - 1) * w + i - 1] = true;
                    mask[(j - 1) * w + i] = true;
                }
            }
        }

        for (idx, visible) in mask.iter().enumerate() {
            if !visible {
                self.cells[idx] = None;
            }
        }

        mask
    }

    /// Encode the grid, hiding cells the mask marks as not visible
    pub fn encode(&self, vis_mask: Option<&[bool]>) -> Image {
        let mut image = Image::new(self.width, self.height);
        for j in 0..self.height {
            for i in 0..self.width {
                let visible = vis_mask.map_or(true, |m| m[j * self.width + i]);
                if !visible {
                    continue;
                }
                let value = match self.get(i, j) {
                    Some(obj) => obj.encode(),
                    None => [ObjectKind::Empty as u8, 0, 0],
                };
                image.set(i, j, value);
            }
        }
        image
    }
}
