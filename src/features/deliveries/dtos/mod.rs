mod delivery_dto;

pub use delivery_dto::{
    AcceptDeliveryDto, CancelDeliveryDto, DeliveryListQuery, DeliveryResponseDto,
    UpdateDeliveryStatusDto,
};
