use ash::vk;

/// 描述一个外部创建的 image，供 barrier 和 blit 使用
///
/// 只是一份 handle 和创建参数的拷贝，不拥有 image 的内存。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GfxImageInfo {
    pub image: vk::Image,
    pub format: vk::Format,
    pub mip_levels: u32,
    pub array_layers: u32,
}

impl GfxImageInfo {
    pub fn new(image: vk::Image, format: vk::Format, mip_levels: u32) -> Self {
        Self {
            image,
            format,
            mip_levels,
            array_layers: 1,
        }
    }

    /// builder
    #[inline]
    pub fn array_layers(mut self, array_layers: u32) -> Self {
        self.array_layers = array_layers;
        self
    }

    #[inline]
    pub fn aspect(&self) -> vk::ImageAspectFlags {
        infer_image_aspect(self.format)
    }

    /// 某一个 mip level 的所有 layer，用于 blit
    pub fn mip_subresource_layers(&self, mip_level: u32) -> vk::ImageSubresourceLayers {
        vk::ImageSubresourceLayers {
            aspect_mask: self.aspect(),
            mip_level,
            base_array_layer: 0,
            layer_count: self.array_layers,
        }
    }
}

/// 根据 format 推断 image 的 aspect flags
pub fn infer_image_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
            vk::ImageAspectFlags::DEPTH
        }

        vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,

        vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }

        _ => vk::ImageAspectFlags::COLOR,
    }
}

/// 完整 mip 链的长度：`floor(log2(max(width, height))) + 1`
///
/// 尺寸为 0 时返回 1
pub fn mip_level_count(extent: vk::Extent2D) -> u32 {
    let max_side = extent.width.max(extent.height).max(1);
    u32::BITS - max_side.leading_zeros()
}

/// 第 `mip_level` 级的尺寸，每个维度最小为 1
pub fn mip_extent(base_extent: vk::Extent2D, mip_level: u32) -> vk::Extent2D {
    vk::Extent2D {
        width: base_extent.width.checked_shr(mip_level).unwrap_or(0).max(1),
        height: base_extent.height.checked_shr(mip_level).unwrap_or(0).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(vk::Extent2D { width: 1, height: 1 }), 1);
        assert_eq!(mip_level_count(vk::Extent2D { width: 256, height: 256 }), 9);
        assert_eq!(mip_level_count(vk::Extent2D { width: 300, height: 17 }), 9);
        assert_eq!(mip_level_count(vk::Extent2D { width: 0, height: 0 }), 1);
    }

    #[test]
    fn test_mip_extent_clamps_to_one() {
        let base = vk::Extent2D { width: 64, height: 16 };
        assert_eq!(mip_extent(base, 0), base);
        assert_eq!(mip_extent(base, 2), vk::Extent2D { width: 16, height: 4 });
        assert_eq!(mip_extent(base, 5), vk::Extent2D { width: 2, height: 1 });
        assert_eq!(mip_extent(base, 40), vk::Extent2D { width: 1, height: 1 });
    }

    #[test]
    fn test_infer_aspect() {
        assert_eq!(infer_image_aspect(vk::Format::R8G8B8A8_UNORM), vk::ImageAspectFlags::COLOR);
        assert_eq!(infer_image_aspect(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            infer_image_aspect(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }
}
