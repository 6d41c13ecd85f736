/// US Letter, in PDF points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// Region every embedded image is scaled to fit.
pub const BOX_WIDTH: f32 = 500.0;
pub const BOX_HEIGHT: f32 = 700.0;

/// Fixed single-page geometry: page size plus the bounding box the image is
/// fitted into. The box sits centered on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub box_width: f32,
    pub box_height: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            box_width: BOX_WIDTH,
            box_height: BOX_HEIGHT,
        }
    }
}

/// Where the image lands on the page. Origin is the bottom-left corner, as
/// in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageLayout {
    /// Scales `pixel_width` x `pixel_height` to fit the bounding box without
    /// distortion and centers the result inside it.
    ///
    /// One pixel maps to one point before scaling, so small images are
    /// enlarged until they touch the box on one axis.
    pub fn fit(&self, pixel_width: u32, pixel_height: u32) -> Placement {
        let (iw, ih) = (pixel_width.max(1) as f32, pixel_height.max(1) as f32);
        let scale = (self.box_width / iw).min(self.box_height / ih);
        let (width, height) = (iw * scale, ih * scale);

        let box_x = (self.page_width - self.box_width) / 2.0;
        let box_y = (self.page_height - self.box_height) / 2.0;

        Placement {
            x: box_x + (self.box_width - width) / 2.0,
            y: box_y + (self.box_height - height) / 2.0,
            width,
            height,
        }
    }
}
