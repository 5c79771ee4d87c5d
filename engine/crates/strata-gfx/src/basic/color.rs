/// debug label 使用的颜色
pub struct LabelColor;
impl LabelColor {
    const GREEN: glam::Vec4 = glam::vec4(0.0, 1.0, 0.0, 1.0);
    const BLUE: glam::Vec4 = glam::vec4(0.0, 0.0, 1.0, 1.0);
    const MAGENTA: glam::Vec4 = glam::vec4(1.0, 0.0, 1.0, 1.0);

    pub const COLOR_TASK: glam::Vec4 = Self::BLUE;
    pub const COLOR_MIPS: glam::Vec4 = Self::MAGENTA;
    pub const COLOR_CMD: glam::Vec4 = Self::GREEN;
}
