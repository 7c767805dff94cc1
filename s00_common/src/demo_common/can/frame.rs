//! CanMessage 与 bxcan 的 Frame 之间的转换

use bxcan::{Frame, Id, StandardId};

use super::CanMessage;

/// 超出 11 位的 ID 无法组成标准帧，返回 None
pub fn to_frame(msg: &CanMessage) -> Option<Frame> {
    let id = StandardId::new(msg.message_id)?;
    Some(Frame::new_data(id, msg.to_bytes()))
}

/// 例程只使用标准数据帧，扩展帧和远程帧都返回 None
pub fn from_frame(frame: &Frame) -> Option<CanMessage> {
    let message_id = match frame.id() {
        Id::Standard(id) => id.as_raw(),
        Id::Extended(_) => return None,
    };

    let data = frame.data()?;
    Some(CanMessage::from_bytes(message_id, data))
}
