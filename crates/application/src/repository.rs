use async_trait::async_trait;
use domain::{ChatRoom, Message, ProductId, RepositoryError, RoomId, Timestamp, UserId};

/// 聊天室注册表的持久化接口。
///
/// `create` 在三元组唯一约束冲突时必须返回 `RepositoryError::Conflict`，
/// 由服务层执行一次重读来解决并发创建竞争。
#[async_trait]
pub trait ChatRoomRepository: Send + Sync {
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError>;

    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError>;

    /// 按 (商品, 买家, 卖家) 三元组精确查找。
    async fn find_by_triple(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        seller_id: UserId,
    ) -> Result<Option<ChatRoom>, RepositoryError>;

    /// 列出用户作为买家或卖家参与的所有房间，按最近更新时间倒序。
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError>;

    /// 更新房间的最近消息快照。尽力而为的簿记，失败不影响消息本身。
    async fn update_last_message(
        &self,
        room_id: RoomId,
        preview: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;

    /// 房间的完整消息历史，按创建时间升序，同一时刻按插入顺序。
    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError>;
}

/// 商品目录的协作边界。
///
/// 聊天子系统只需要知道某个商品的卖家是谁，目录本身归商品模块所有。
#[async_trait]
pub trait ProductDirectory: Send + Sync {
    async fn find_owner(&self, product_id: ProductId) -> Result<Option<UserId>, RepositoryError>;
}
