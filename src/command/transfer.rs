use crate::{
    api_log,
    command::CommandEncoderError,
    global::Global,
    id::{BufferId, CommandEncoderId, TextureId},
    resource::TextureSize,
};

pub type ImageCopyBuffer = wgt::ImageCopyBuffer<BufferId>;
pub type ImageCopyTexture = wgt::ImageCopyTexture<TextureId>;

// Copies are recorded against no device timeline. Each entry point checks that
// the encoder is still recording and otherwise has no effect; in particular,
// recorded buffer and texture content is left untouched.
impl Global {
    pub fn command_encoder_copy_buffer_to_buffer(
        &self,
        command_encoder_id: CommandEncoderId,
        source: BufferId,
        source_offset: wgt::BufferAddress,
        destination: BufferId,
        destination_offset: wgt::BufferAddress,
        size: wgt::BufferAddress,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::copy_buffer_to_buffer");
        api_log!(
            "CommandEncoder::copy_buffer_to_buffer {source:?}[{source_offset}] -> {destination:?}[{destination_offset}] ({size} bytes)"
        );

        self.get_encoder(command_encoder_id)?.check_recording()
    }

    pub fn command_encoder_copy_buffer_to_texture(
        &self,
        command_encoder_id: CommandEncoderId,
        source: &ImageCopyBuffer,
        destination: &ImageCopyTexture,
        copy_size: impl Into<TextureSize>,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::copy_buffer_to_texture");
        api_log!(
            "CommandEncoder::copy_buffer_to_texture {:?} -> {:?} {:?}",
            source.buffer,
            destination.texture,
            copy_size.into().normalize()
        );

        self.get_encoder(command_encoder_id)?.check_recording()
    }

    pub fn command_encoder_copy_texture_to_buffer(
        &self,
        command_encoder_id: CommandEncoderId,
        source: &ImageCopyTexture,
        destination: &ImageCopyBuffer,
        copy_size: impl Into<TextureSize>,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::copy_texture_to_buffer");
        api_log!(
            "CommandEncoder::copy_texture_to_buffer {:?} -> {:?} {:?}",
            source.texture,
            destination.buffer,
            copy_size.into().normalize()
        );

        self.get_encoder(command_encoder_id)?.check_recording()
    }

    pub fn command_encoder_copy_texture_to_texture(
        &self,
        command_encoder_id: CommandEncoderId,
        source: &ImageCopyTexture,
        destination: &ImageCopyTexture,
        copy_size: impl Into<TextureSize>,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::copy_texture_to_texture");
        api_log!(
            "CommandEncoder::copy_texture_to_texture {:?} -> {:?} {:?}",
            source.texture,
            destination.texture,
            copy_size.into().normalize()
        );

        self.get_encoder(command_encoder_id)?.check_recording()
    }

    pub fn command_encoder_clear_buffer(
        &self,
        command_encoder_id: CommandEncoderId,
        dst: BufferId,
        offset: wgt::BufferAddress,
        size: Option<wgt::BufferAddress>,
    ) -> Result<(), CommandEncoderError> {
        profiling::scope!("CommandEncoder::clear_buffer");
        api_log!("CommandEncoder::clear_buffer {dst:?} offset {offset} size {size:?}");

        self.get_encoder(command_encoder_id)?.check_recording()
    }
}
