// Menu module - Platform settings menu
//
// A single-level menu with four items: Go back, Scaling, V-Sync and Exit.
// Left picks the first choice of a two-way item (2x / off), Right or Confirm
// picks the second (2.5x / on). Cancel and the toggle key leave the menu.
//
// There is no font renderer; each item is drawn as a row with a colour
// marker and, for two-way items, a pair of value swatches.

use crate::display::{rgb565, PanelFrame, Rect, ScalingMode};
use crate::host::{MenuHost, MenuStatus};
use crate::pipeline::VideoConfig;
use log::{debug, info};
use std::collections::VecDeque;

/// Keys queued before they are processed
const MAX_PENDING_KEYS: usize = 16;

/// Menu input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    /// Open or close the menu
    Toggle,
    /// Previous item
    Up,
    /// Next item
    Down,
    /// First choice
    Left,
    /// Second choice
    Right,
    /// Activate the item
    Confirm,
    /// Leave the menu
    Cancel,
}

/// Menu entries, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    /// Close the menu
    GoBack,
    /// 2x / 2.5x scaling
    Scaling,
    /// Vertical sync on / off
    VSync,
    /// Quit the application
    Exit,
}

/// All items in display order
pub const MENU_ITEMS: [MenuItem; 4] = [
    MenuItem::GoBack,
    MenuItem::Scaling,
    MenuItem::VSync,
    MenuItem::Exit,
];

const BACKGROUND: u16 = rgb565(0x10, 0x18, 0x28);
const ROW: u16 = rgb565(0x30, 0x40, 0x58);
const ROW_SELECTED: u16 = rgb565(0xE0, 0xC0, 0x40);
const SWATCH_ON: u16 = rgb565(0x40, 0xE0, 0x60);
const SWATCH_OFF: u16 = rgb565(0x50, 0x50, 0x50);
const MARKERS: [u16; 4] = [
    rgb565(0xFF, 0xFF, 0xFF),
    rgb565(0x40, 0xA0, 0xFF),
    rgb565(0xFF, 0x80, 0x40),
    rgb565(0xE0, 0x30, 0x30),
];

const ROW_X: usize = 40;
const ROW_Y: usize = 32;
const ROW_WIDTH: usize = 160;
const ROW_HEIGHT: usize = 20;
const ROW_SPACING: usize = 24;

/// Row rectangle of the item at `index`
pub fn row_rect(index: usize) -> Rect {
    Rect::new(ROW_X, ROW_Y + index * ROW_SPACING, ROW_WIDTH, ROW_HEIGHT)
}

/// Swatch rectangle for choice 0 (first) or 1 (second) of the item at `index`
pub fn swatch_rect(index: usize, choice: usize) -> Rect {
    let row = row_rect(index);
    Rect::new(row.right() - 36 + choice * 18, row.y + 4, 12, 12)
}

/// Settings menu for the platform front-end
#[derive(Debug, Clone)]
pub struct PlatformMenu {
    active: bool,
    selected: usize,
    scaling: ScalingMode,
    vsync: bool,
    applied: (ScalingMode, bool),
    pending: VecDeque<MenuKey>,
    quit: bool,
}

impl PlatformMenu {
    /// Create a closed menu with the given initial settings
    pub fn new(scaling: ScalingMode, vsync: bool) -> Self {
        Self {
            active: false,
            selected: 0,
            scaling,
            vsync,
            applied: (scaling, vsync),
            pending: VecDeque::with_capacity(MAX_PENDING_KEYS),
            quit: false,
        }
    }

    /// Create a closed menu from the video configuration
    pub fn from_config(video: &VideoConfig) -> Self {
        Self::new(video.scaling, video.vsync)
    }

    /// Write the current selection back into the video configuration
    pub fn apply_to(&self, video: &mut VideoConfig) {
        video.scaling = self.scaling;
        video.vsync = self.vsync;
    }

    /// Open the menu on the first item
    pub fn open(&mut self) {
        if !self.active {
            self.active = true;
            self.selected = 0;
            self.pending.clear();
            info!("Menu opened");
        }
    }

    /// Whether the menu is open
    pub fn is_open(&self) -> bool {
        self.active
    }

    /// Highlighted item
    pub fn selected(&self) -> MenuItem {
        MENU_ITEMS[self.selected]
    }

    /// Whether the selection differs from what the pipeline last applied
    pub fn has_unapplied_change(&self) -> bool {
        self.applied != (self.scaling, self.vsync)
    }

    /// Feed one key press
    ///
    /// While closed only the toggle key does anything (it opens the menu).
    /// While open keys are queued until the next `process`.
    pub fn handle_key(&mut self, key: MenuKey) {
        if !self.active {
            if key == MenuKey::Toggle {
                self.open();
            }
            return;
        }
        if self.pending.len() < MAX_PENDING_KEYS {
            self.pending.push_back(key);
        } else {
            debug!("menu key {:?} dropped, queue full", key);
        }
    }

    fn choose(&mut self, item: MenuItem, second: bool) {
        match item {
            MenuItem::Scaling => {
                self.scaling = if second {
                    ScalingMode::Interpolated2_5x
                } else {
                    ScalingMode::Integer2x
                };
            }
            MenuItem::VSync => self.vsync = second,
            MenuItem::GoBack | MenuItem::Exit => {}
        }
    }

    fn close(&mut self) {
        self.active = false;
        self.pending.clear();
    }

    fn apply_key(&mut self, key: MenuKey) {
        let count = MENU_ITEMS.len();
        let item = self.selected();
        match key {
            MenuKey::Up => self.selected = (self.selected + count - 1) % count,
            MenuKey::Down => self.selected = (self.selected + 1) % count,
            MenuKey::Left => self.choose(item, false),
            MenuKey::Right => self.choose(item, true),
            MenuKey::Confirm => match item {
                MenuItem::GoBack => self.close(),
                MenuItem::Exit => {
                    self.quit = true;
                    self.close();
                }
                other => self.choose(other, true),
            },
            MenuKey::Cancel | MenuKey::Toggle => self.close(),
        }
    }
}

impl Default for PlatformMenu {
    fn default() -> Self {
        Self::new(ScalingMode::default(), true)
    }
}

impl MenuHost for PlatformMenu {
    fn is_menu_active(&self) -> bool {
        self.active
    }

    fn scaling_mode(&self) -> ScalingMode {
        self.scaling
    }

    fn vertical_sync(&self) -> bool {
        self.vsync
    }

    fn process(&mut self) -> MenuStatus {
        while self.active {
            let Some(key) = self.pending.pop_front() else {
                break;
            };
            self.apply_key(key);
        }

        if self.quit {
            MenuStatus::Quit
        } else if self.active {
            MenuStatus::Open
        } else {
            MenuStatus::Resume
        }
    }

    fn render(&mut self, canvas: &mut PanelFrame) {
        canvas.clear(BACKGROUND);

        for (index, item) in MENU_ITEMS.iter().enumerate() {
            let color = if index == self.selected {
                ROW_SELECTED
            } else {
                ROW
            };
            let row = row_rect(index);
            canvas.fill_rect(row, color);
            canvas.fill_rect(Rect::new(row.x + 4, row.y + 4, 12, 12), MARKERS[index]);

            let second = match item {
                MenuItem::Scaling => Some(self.scaling == ScalingMode::Interpolated2_5x),
                MenuItem::VSync => Some(self.vsync),
                MenuItem::GoBack | MenuItem::Exit => None,
            };
            if let Some(second) = second {
                let (first_color, second_color) = if second {
                    (SWATCH_OFF, SWATCH_ON)
                } else {
                    (SWATCH_ON, SWATCH_OFF)
                };
                canvas.fill_rect(swatch_rect(index, 0), first_color);
                canvas.fill_rect(swatch_rect(index, 1), second_color);
            }
        }
    }

    fn acknowledge_config_change(&mut self) {
        if self.has_unapplied_change() {
            info!(
                "Display configuration applied: {} scaling, vsync {}",
                self.scaling, self.vsync
            );
        }
        self.applied = (self.scaling, self.vsync);
    }
}
