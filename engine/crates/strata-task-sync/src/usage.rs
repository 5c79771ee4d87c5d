//! 资源用途（usage kind）到同步信息的映射
//!
//! 每一种用途只在一张表里登记一次 `{is_read, access, first_stage, last_stage, layout}`，
//! "作为 barrier 的 src" 和 "作为 barrier 的 dst" 两种视角都从这张表推导。
//!
//! - `first_stage`：该用途最早访问资源的 stage，作为 dst 时需要在这个 stage 之前等待
//! - `last_stage`：该用途最晚访问资源的 stage，作为 WAR 的 src 时需要等这个 stage 结束

use ash::vk;

/// Buffer 的用途
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsageKind {
    IndirectDrawSource,
    IndexSource,
    VertexSource,
    UniformSource,
    ComputeRead,
    ComputeWrite,
    TransferRead,
    TransferWrite,
}

/// Image 的用途，每一种都对应一个固定的 layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageUsageKind {
    /// 图形管线采样，`SHADER_READ_ONLY_OPTIMAL`
    GraphicsSampledRead,
    /// blit / copy 的源，`TRANSFER_SRC_OPTIMAL`
    TransferSource,
    /// blit / copy 的目标，`TRANSFER_DST_OPTIMAL`
    TransferDestination,
    /// compute shader 的 storage image，`GENERAL`
    ComputeReadWrite,
}

/// 表中的一行
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageInfo {
    pub is_read: bool,
    pub access: vk::AccessFlags2,
    pub first_stage: vk::PipelineStageFlags2,
    pub last_stage: vk::PipelineStageFlags2,
    /// buffer 没有 layout
    pub layout: Option<vk::ImageLayout>,
}

impl UsageInfo {
    const fn new(is_read: bool, access: vk::AccessFlags2, stage: vk::PipelineStageFlags2) -> Self {
        Self {
            is_read,
            access,
            first_stage: stage,
            last_stage: stage,
            layout: None,
        }
    }

    const fn last_stage(mut self, last_stage: vk::PipelineStageFlags2) -> Self {
        self.last_stage = last_stage;
        self
    }

    const fn layout(mut self, layout: vk::ImageLayout) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// 资源在某一时刻的同步状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncInfo {
    pub access: vk::AccessFlags2,
    pub stage: vk::PipelineStageFlags2,
    pub layout: Option<vk::ImageLayout>,
}

/// 写操作的 access flags
const WRITE_ACCESS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::SHADER_WRITE.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw()
        | vk::AccessFlags2::TRANSFER_WRITE.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::MEMORY_WRITE.as_raw(),
);

/// buffer 和 image 的用途共用的查询接口
pub trait UsageKind: Copy + Eq + std::fmt::Debug {
    fn info(self) -> UsageInfo;
}

impl UsageKind for BufferUsageKind {
    fn info(self) -> UsageInfo {
        type A = vk::AccessFlags2;
        type S = vk::PipelineStageFlags2;

        match self {
            Self::IndirectDrawSource => UsageInfo::new(true, A::INDIRECT_COMMAND_READ, S::DRAW_INDIRECT),
            Self::IndexSource => UsageInfo::new(true, A::INDEX_READ, S::VERTEX_INPUT),
            Self::VertexSource => UsageInfo::new(true, A::VERTEX_ATTRIBUTE_READ, S::VERTEX_INPUT),
            // uniform 可能在任意图形 shader 中读取
            Self::UniformSource => {
                UsageInfo::new(true, A::UNIFORM_READ, S::VERTEX_SHADER).last_stage(S::FRAGMENT_SHADER)
            }
            Self::ComputeRead => UsageInfo::new(true, A::SHADER_READ, S::COMPUTE_SHADER),
            Self::ComputeWrite => UsageInfo::new(false, A::SHADER_WRITE, S::COMPUTE_SHADER),
            Self::TransferRead => UsageInfo::new(true, A::TRANSFER_READ, S::TRANSFER),
            Self::TransferWrite => UsageInfo::new(false, A::TRANSFER_WRITE, S::TRANSFER),
        }
    }
}

impl UsageKind for ImageUsageKind {
    fn info(self) -> UsageInfo {
        type A = vk::AccessFlags2;
        type S = vk::PipelineStageFlags2;
        type L = vk::ImageLayout;

        match self {
            // 采样最早可能发生在 vertex shader
            Self::GraphicsSampledRead => UsageInfo::new(true, A::SHADER_READ, S::VERTEX_SHADER)
                .last_stage(S::FRAGMENT_SHADER)
                .layout(L::SHADER_READ_ONLY_OPTIMAL),
            Self::TransferSource => {
                UsageInfo::new(true, A::TRANSFER_READ, S::TRANSFER).layout(L::TRANSFER_SRC_OPTIMAL)
            }
            Self::TransferDestination => {
                UsageInfo::new(false, A::TRANSFER_WRITE, S::TRANSFER).layout(L::TRANSFER_DST_OPTIMAL)
            }
            Self::ComputeReadWrite => UsageInfo::new(
                false,
                A::from_raw(A::SHADER_READ.as_raw() | A::SHADER_WRITE.as_raw()),
                S::COMPUTE_SHADER,
            )
            .layout(L::GENERAL),
        }
    }
}

/// 只读用途返回 true
#[inline]
pub fn is_read<K: UsageKind>(kind: K) -> bool {
    kind.info().is_read
}

/// 该用途访问资源的最晚 stage，用于构造 WAR barrier 的 src stage
#[inline]
pub fn stage_of<K: UsageKind>(kind: K) -> vk::PipelineStageFlags2 {
    kind.info().last_stage
}

/// 该用途作为后续访问的 barrier src：只有写操作会产生需要 flush 的数据，只读用途返回 `None`
pub fn src_sync_info<K: UsageKind>(kind: K) -> Option<SyncInfo> {
    let info = kind.info();
    if info.is_read {
        return None;
    }
    Some(SyncInfo {
        access: info.access & WRITE_ACCESS,
        stage: info.last_stage,
        layout: info.layout,
    })
}

/// 该用途作为 barrier dst 时需要等待的 access / stage / layout
pub fn dst_sync_info<K: UsageKind>(kind: K) -> SyncInfo {
    let info = kind.info();
    SyncInfo {
        access: info.access,
        stage: info.first_stage,
        layout: info.layout,
    }
}

/// 需要 barrier 的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardKind {
    ReadAfterWrite,
    WriteAfterRead,
    WriteAfterWrite,
    /// 读后读，但是 layout 不同
    LayoutTransition,
}

/// 一个资源在两次访问之间需要的 barrier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hazard {
    pub kind: HazardKind,
    pub src: SyncInfo,
    pub dst: SyncInfo,
}

impl Hazard {
    #[inline]
    pub fn is_layout_transition(&self) -> bool {
        self.src.layout != self.dst.layout
    }
}

/// 判断资源在 `last` 用途之后以 `next` 用途访问是否需要 barrier
///
/// 1. 没有记录：第一次使用，不需要 barrier
/// 2. 写后写：src 为上一次写入，dst 为本次写入
/// 3. 读后写（WAR）：只需要执行依赖，src 只有 stage，没有 access
/// 4. 写后读（RAW）：src 为上一次写入，dst 为本次读取
/// 5. 读后读：不需要 barrier，除非 layout 不同
pub fn hazard<K: UsageKind>(last: Option<K>, next: K) -> Option<Hazard> {
    let last = last?;
    let last_info = last.info();
    let next_info = next.info();

    let kind = match (last_info.is_read, next_info.is_read) {
        (false, false) => HazardKind::WriteAfterWrite,
        (true, false) => HazardKind::WriteAfterRead,
        (false, true) => HazardKind::ReadAfterWrite,
        (true, true) if last_info.layout != next_info.layout => HazardKind::LayoutTransition,
        (true, true) => return None,
    };

    let src = src_sync_info(last).unwrap_or(SyncInfo {
        access: vk::AccessFlags2::NONE,
        stage: stage_of(last),
        layout: last_info.layout,
    });

    Some(Hazard {
        kind,
        src,
        dst: dst_sync_info(next),
    })
}

/// 一个任务中同一个资源可能以多个用途出现，任务结束后账本中记录的用途：
/// 有写入时取最后一个写入用途，否则取最后一个读取用途
pub fn resolve_final_usage<K: UsageKind>(kinds: &[K]) -> Option<K> {
    kinds.iter().rev().find(|kind| !is_read(**kind)).or_else(|| kinds.last()).copied()
}
