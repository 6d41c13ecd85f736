use std::{
    fs::File,
    io::{BufWriter, Cursor},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use image::{
    metadata::Orientation, ColorType, DynamicImage, ImageDecoder, ImageError, ImageFormat,
    ImageReader,
};
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, ObjectId, Stream,
};
use tracing::{info, warn};

use crate::{
    application::{error::ApplicationError, services::DocumentGenerator},
    domain::models::layout::{PageLayout, Placement},
    services::error::GenerationError,
};

const IMAGE_RESOURCE: &[u8] = b"Im0";

pub struct PdfDocumentGenerator {
    layout: PageLayout,
}

impl PdfDocumentGenerator {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }
}

impl Default for PdfDocumentGenerator {
    fn default() -> Self {
        Self::new(PageLayout::default())
    }
}

#[async_trait]
impl DocumentGenerator for PdfDocumentGenerator {
    async fn generate(
        &self,
        image_path: &Path,
        output_path: &Path,
    ) -> Result<Placement, ApplicationError> {
        let layout = self.layout;
        let source = image_path.to_path_buf();
        let target = output_path.to_path_buf();

        // Decoding and PDF assembly are CPU bound; keep them off the reactor.
        let result = tokio::task::spawn_blocking(move || render(&layout, &source, &target))
            .await
            .map_err(GenerationError::from)
            .and_then(|rendered| rendered);

        match result {
            Ok(placement) => {
                info!(
                    "Rendered {} into {} ({:.1}x{:.1} at {:.1},{:.1})",
                    image_path.display(),
                    output_path.display(),
                    placement.width,
                    placement.height,
                    placement.x,
                    placement.y
                );
                Ok(placement)
            }
            Err(e) => {
                warn!("PDF generation failed: {}", e);
                Err(e.into())
            }
        }
    }
}

fn render(
    layout: &PageLayout,
    image_path: &Path,
    output_path: &Path,
) -> Result<Placement, GenerationError> {
    let source = SourceImage::load(image_path)?;
    let placement = layout.fit(source.width, source.height);
    let mut document = build_document(layout, source, placement)?;
    write_document(&mut document, output_path)?;
    Ok(placement)
}

/// Image samples ready to be dropped into an image XObject.
struct SourceImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    data: Vec<u8>,
    /// Set when `data` is already a JPEG stream.
    dct_encoded: bool,
    alpha: Option<Vec<u8>>,
}

impl SourceImage {
    fn load(path: &Path) -> Result<Self, GenerationError> {
        let decode_error = |source| GenerationError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let bytes = std::fs::read(path).map_err(|e| decode_error(ImageError::IoError(e)))?;
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| decode_error(ImageError::IoError(e)))?;
        let format = reader.format();

        let mut decoder = reader.into_decoder().map_err(decode_error)?;
        let orientation = decoder.orientation().map_err(decode_error)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

        if orientation != Orientation::NoTransforms {
            image.apply_orientation(orientation);
            return Ok(Self::from_pixels(image));
        }

        if format == Some(ImageFormat::Jpeg) {
            if let Some(color_space) = jpeg_passthrough_color_space(&bytes, image.color()) {
                return Ok(Self {
                    width: image.width(),
                    height: image.height(),
                    color_space,
                    data: bytes,
                    dct_encoded: true,
                    alpha: None,
                });
            }
        }

        Ok(Self::from_pixels(image))
    }

    fn from_pixels(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let color = image.color();

        if color.has_alpha() {
            let rgba = image.into_rgba8();
            let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
            let mut alpha = Vec::with_capacity(width as usize * height as usize);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            return Self {
                width,
                height,
                color_space: "DeviceRGB",
                data: rgb,
                dct_encoded: false,
                alpha: Some(alpha),
            };
        }

        if !color.has_color() {
            return Self {
                width,
                height,
                color_space: "DeviceGray",
                data: image.into_luma8().into_raw(),
                dct_encoded: false,
                alpha: None,
            };
        }

        Self {
            width,
            height,
            color_space: "DeviceRGB",
            data: image.into_rgb8().into_raw(),
            dct_encoded: false,
            alpha: None,
        }
    }
}

/// Color space to declare when the JPEG can be embedded untouched, or `None`
/// when it has to be re-encoded. The decoder reports CMYK/YCCK sources as
/// RGB, so the component count comes from the frame header itself.
fn jpeg_passthrough_color_space(jpeg: &[u8], decoded: ColorType) -> Option<&'static str> {
    match (jpeg_components(jpeg)?, decoded) {
        (3, ColorType::Rgb8) => Some("DeviceRGB"),
        (1, ColorType::L8) => Some("DeviceGray"),
        _ => None,
    }
}

/// Component count from the first SOFn segment.
fn jpeg_components(jpeg: &[u8]) -> Option<u8> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    loop {
        if *jpeg.get(pos)? != 0xFF {
            return None;
        }
        let marker = *jpeg.get(pos + 1)?;
        match marker {
            // fill bytes
            0xFF => {
                pos += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = u16::from_be_bytes([*jpeg.get(pos + 2)?, *jpeg.get(pos + 3)?]) as usize;
        let is_frame_header = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame_header {
            // length(2) precision(1) height(2) width(2) components(1)
            return jpeg.get(pos + 9).copied();
        }
        pos += 2 + length;
    }
}

fn image_dictionary(width: u32, height: u32, color_space: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8i64,
    }
}

fn build_document(
    layout: &PageLayout,
    source: SourceImage,
    placement: Placement,
) -> Result<Document, GenerationError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = add_image(&mut doc, source);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    placement.width.into(),
                    0.0f32.into(),
                    0.0f32.into(),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(
        Stream::new(dictionary! {}, content.encode()?).with_compression(false),
    );

    let media_box: Vec<Object> = vec![
        0.0f32.into(),
        0.0f32.into(),
        layout.page_width.into(),
        layout.page_height.into(),
    ];
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();
    Ok(doc)
}

fn add_image(doc: &mut Document, source: SourceImage) -> ObjectId {
    let mut dict = image_dictionary(source.width, source.height, source.color_space);

    if let Some(alpha) = source.alpha {
        let mask_id = doc.add_object(Stream::new(
            image_dictionary(source.width, source.height, "DeviceGray"),
            alpha,
        ));
        dict.set("SMask", mask_id);
    }

    if source.dct_encoded {
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        doc.add_object(Stream::new(dict, source.data).with_compression(false))
    } else {
        doc.add_object(Stream::new(dict, source.data))
    }
}

fn write_document(document: &mut Document, output_path: &Path) -> Result<(), GenerationError> {
    let io_error = |source| GenerationError::Io {
        path: PathBuf::from(output_path),
        source,
    };

    let file = File::create(output_path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    document
        .save_to(&mut writer)
        .map_err(lopdf::Error::from)?;

    // The document only counts as finished once every byte reached the disk.
    let file = writer.into_inner().map_err(|e| io_error(e.into_error()))?;
    file.sync_all().map_err(io_error)?;
    Ok(())
}
