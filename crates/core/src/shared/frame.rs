use ndarray::{s, ArrayView3};

pub const CHANNELS: usize = 3;

/// Byte order of the three interleaved colour channels in a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red. What decoders in this crate produce.
    Bgr,
    Rgb,
}

/// A single video frame: contiguous 8-bit pixels in row-major order,
/// `height x width x 3`.
///
/// Channel order travels with the data so encoders can convert at the I/O
/// boundary instead of assuming one.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            order,
            index,
        }
    }

    /// A frame filled with one colour, given in the frame's channel order.
    pub fn filled(width: u32, height: u32, order: ChannelOrder, pixel: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = pixel.iter().copied().cycle().take(pixels * CHANNELS).collect();
        Self::new(data, width, height, order, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns the frame with its channels in `order`, swapping red and blue
    /// when the current order differs.
    pub fn to_order(&self, order: ChannelOrder) -> Frame {
        if self.order == order {
            return self.clone();
        }
        let swapped: Vec<u8> = self
            .as_ndarray()
            .slice(s![.., .., ..;-1])
            .iter()
            .copied()
            .collect();
        Frame::new(swapped, self.width, self.height, order, self.index)
    }

    /// Copies the frame into an RGB `image` buffer. `None` only if the pixel
    /// buffer does not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let rgb = self.to_order(ChannelOrder::Rgb);
        image::RgbImage::from_raw(self.width, self.height, rgb.into_data())
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
