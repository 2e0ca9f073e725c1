use crate::domain::model::{DeviceName, DeviceProfile};

pub const DEVICE_PROFILES: [DeviceProfile; 3] = [
    DeviceProfile {
        name: DeviceName::Desktop,
        width: 1920,
    },
    DeviceProfile {
        name: DeviceName::Tablet,
        width: 1024,
    },
    DeviceProfile {
        name: DeviceName::Mobile,
        width: 375,
    },
];

pub fn profile(name: DeviceName) -> DeviceProfile {
    match name {
        DeviceName::Desktop => DEVICE_PROFILES[0],
        DeviceName::Tablet => DEVICE_PROFILES[1],
        DeviceName::Mobile => DEVICE_PROFILES[2],
    }
}

/// 依固定順序（desktop, tablet, mobile）回傳被選中的裝置，重複的選擇只算一次
pub fn select(names: &[DeviceName]) -> Vec<DeviceProfile> {
    DEVICE_PROFILES
        .iter()
        .filter(|p| names.contains(&p.name))
        .copied()
        .collect()
}

/// 選單答案如 "13" 或 "1,2"：出現 1/2/3 即選取對應裝置
pub fn parse_menu_choice(choice: &str) -> Vec<DeviceName> {
    let mut names = Vec::new();
    if choice.contains('1') {
        names.push(DeviceName::Desktop);
    }
    if choice.contains('2') {
        names.push(DeviceName::Tablet);
    }
    if choice.contains('3') {
        names.push(DeviceName::Mobile);
    }
    names
}
