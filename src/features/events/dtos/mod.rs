mod event_dto;

pub use event_dto::{
    CreateEventDto, EventImportRowDto, EventListQuery, EventResponseDto, ImportEventsDto,
    ImportEventsResultDto, ImportRowErrorDto, UpdateEventDto,
};
