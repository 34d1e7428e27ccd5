mod partner_dto;

pub use partner_dto::{
    CreatePartnerDto, PartnerDetailResponseDto, PartnerListQuery, PartnerResponseDto,
    PartnerStatsDto, UpdateNeedLevelDto, UpdatePartnerDto,
};
