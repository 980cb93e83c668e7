use crate::{
    api_log,
    command::CommandEncoderError,
    global::Global,
    id,
};

impl Global {
    pub fn command_encoder_write_timestamp(
        &self,
        command_encoder_id: id::CommandEncoderId,
        query_set_id: id::QuerySetId,
        query_index: u32,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::write_timestamp");
        api_log!("CommandEncoder::write_timestamp {query_set_id:?} {query_index}");

        self.get_encoder(command_encoder_id)?.check_recording()
    }

    /// Accepted with no effect: no query ever produces a result, so the
    /// destination buffer's recorded content is left as it was.
    pub fn command_encoder_resolve_query_set(
        &self,
        command_encoder_id: id::CommandEncoderId,
        query_set_id: id::QuerySetId,
        start_query: u32,
        query_count: u32,
        destination: id::BufferId,
        destination_offset: wgt::BufferAddress,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::resolve_query_set");
        api_log!(
            "CommandEncoder::resolve_query_set {query_set_id:?} {start_query}..{} -> {destination:?}[{destination_offset}]",
            start_query.saturating_add(query_count)
        );

        self.get_encoder(command_encoder_id)?.check_recording()
    }
}
